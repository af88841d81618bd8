//! Six concrete end-to-end scenarios covering the wire protocol, session
//! state machine, and method dispatch together, driven against real
//! [`Session`] + [`Dispatcher`] instances over the `svcbus-transport`
//! loopback broker.
//!
//! Each test's doc comment names the scenario it covers.

use std::sync::Arc;
use std::time::Duration;

use svcbus::prelude::*;
use svcbus_transport::testing::LoopbackBroker;

struct Add;
impl MethodHandler for Add {
    fn call(&self, ctx: &CallContext, responder: &mut Responder<'_>) -> svcbus_core::Result<()> {
        let sum: i64 = ctx.params.iter().filter_map(Value::as_u64).map(|n| n as i64).sum();
        responder.respond_complete([Value::from(sum)]);
        Ok(())
    }
}

/// Builds a worker dispatcher already registered as `service` on `broker`.
fn worker_for(broker: &LoopbackBroker, service: &str, label: &str) -> Dispatcher {
    let mut registry = Registry::new();
    registry.register(service, "add", Arc::new(Add), 1, MethodOptions::default());
    registry.freeze();

    let mut transport = broker.connect(label);
    transport.connect("").unwrap();
    transport.register_service(service).unwrap();

    let mut dispatcher = Dispatcher::new(service, registry, Box::new(transport));
    dispatcher.connect("").unwrap();
    dispatcher
}

/// Scenario 1 — math add: `osrf.math / add` with params `[2, 2]` yields one
/// RESULT `{statusCode:200, content:4}` followed by one STATUS 205.
#[test]
fn scenario_1_math_add() {
    let broker = LoopbackBroker::new();
    let mut dispatcher = worker_for(&broker, "math", "worker");

    let session = Session::open("math", Box::new(broker.connect("client")), "", "en-US", 0).unwrap();
    let request = Session::request(&session, "add", vec![Value::from(2i64), Value::from(2i64)], Duration::from_secs(1)).unwrap();

    dispatcher.pump(Duration::from_millis(200)).unwrap();

    let content = request.recv(Duration::from_millis(200)).unwrap();
    assert_eq!(content.and_then(|v| v.as_u64()), Some(4));
    assert_eq!(request.recv(Duration::from_millis(50)).unwrap(), None, "the queue drains after the one RESULT");
    assert!(request.is_complete(), "the terminal STATUS 205 must have completed the request");
}

/// Scenario 2 — class-hint round trip: registering `osrfException` and
/// encoding a tagged value with it must produce the bit-exact `{"__c", "__p"}`
/// shape, and decoding must recover the same hint and payload.
#[test]
fn scenario_2_class_hint_round_trip() {
    let registry = HintRegistry::new();
    registry.register("osrfException", "OpenSRF::DomainObject::oilsException");

    let codec = JsonCodec::new();
    let value = Value::tagged("osrfException", Value::object([("foo".to_string(), Value::from("bar"))]));
    let bytes = codec.encode(&value).unwrap();
    assert_eq!(bytes, br#"{"__c":"osrfException","__p":{"foo":"bar"}}"#.to_vec());

    let decoded = codec.decode(&bytes).unwrap();
    assert_eq!(decoded.class_hint(), Some("osrfException"));
    assert_eq!(
        registry.class_for("osrfException").as_deref(),
        Some("OpenSRF::DomainObject::oilsException")
    );
    assert_eq!(decoded, value);
}

struct RespondTwiceThenComplete;
impl MethodHandler for RespondTwiceThenComplete {
    fn call(&self, _ctx: &CallContext, responder: &mut Responder<'_>) -> svcbus_core::Result<()> {
        responder.respond(Value::from("a"));
        responder.respond(Value::from("b"));
        responder.respond_complete(std::iter::empty());
        responder.respond(Value::from("c"));
        Ok(())
    }
}

/// Scenario 3 — respond-after-complete is discarded: a handler calling
/// `respond("a"); respond("b"); respond_complete(); respond("c")` must leave
/// the client observing only `["a", "b"]` before the terminal STATUS.
#[test]
fn scenario_3_respond_after_complete_is_discarded() {
    let broker = LoopbackBroker::new();
    let mut registry = Registry::new();
    registry.register("echo", "twice", Arc::new(RespondTwiceThenComplete), 0, MethodOptions::default());
    registry.freeze();
    let mut transport = broker.connect("worker");
    transport.connect("").unwrap();
    transport.register_service("echo").unwrap();
    let mut dispatcher = Dispatcher::new("echo", registry, Box::new(transport));
    dispatcher.connect("").unwrap();

    let session = Session::open("echo", Box::new(broker.connect("client")), "", "en-US", 0).unwrap();
    let request = Session::request(&session, "twice", vec![], Duration::from_secs(1)).unwrap();
    dispatcher.pump(Duration::from_millis(200)).unwrap();

    let mut observed = Vec::new();
    while let Some(value) = request.recv(Duration::from_millis(100)).unwrap() {
        observed.push(value.as_str().map(str::to_string));
    }
    assert_eq!(observed, vec![Some("a".to_string()), Some("b".to_string())]);
    assert!(request.is_complete());
}

/// Scenario 4 — unknown method: invoking a method the registry never saw
/// yields a single STATUS 404 and no RESULT, and the session remains usable
/// for a subsequent valid call.
#[test]
fn scenario_4_unknown_method_then_session_still_usable() {
    let broker = LoopbackBroker::new();
    let mut dispatcher = worker_for(&broker, "math", "worker");

    let session = Session::open("math", Box::new(broker.connect("client")), "", "en-US", 0).unwrap();

    let bad = Session::request(&session, "nope", vec![], Duration::from_secs(1)).unwrap();
    dispatcher.pump(Duration::from_millis(200)).unwrap();
    assert_eq!(bad.recv(Duration::from_millis(100)).unwrap(), None, "a 404 carries no RESULT");
    assert!(bad.is_complete());
    assert!(bad.last_error().unwrap().contains("no such method"));

    let good = Session::request(&session, "add", vec![Value::from(5i64), Value::from(5i64)], Duration::from_secs(1)).unwrap();
    dispatcher.pump(Duration::from_millis(200)).unwrap();
    assert_eq!(good.recv(Duration::from_millis(100)).unwrap().and_then(|v| v.as_u64()), Some(10));
}

struct EchoLocale;
impl MethodHandler for EchoLocale {
    fn call(&self, ctx: &CallContext, responder: &mut Responder<'_>) -> svcbus_core::Result<()> {
        responder.respond_complete([Value::from(ctx.locale.as_str())]);
        Ok(())
    }
}

/// Scenario 5 — locale echo: every RESULT/STATUS the server emits for a
/// REQUEST carries the locale that REQUEST was sent with. The handler here
/// echoes `ctx.locale` back as its content so the assertion observes the
/// locale through the ordinary client API rather than by hand-decoding the
/// wire batch.
#[test]
fn scenario_5_locale_echo() {
    let broker = LoopbackBroker::new();
    let mut registry = Registry::new();
    registry.register("i18n", "whoami", Arc::new(EchoLocale), 0, MethodOptions::default());
    registry.freeze();
    let mut transport = broker.connect("worker");
    transport.connect("").unwrap();
    transport.register_service("i18n").unwrap();
    let mut dispatcher = Dispatcher::new("i18n", registry, Box::new(transport));
    dispatcher.connect("").unwrap();

    let session = Session::open("i18n", Box::new(broker.connect("client")), "", "fr-CA", 0).unwrap();
    let request = Session::request(&session, "whoami", vec![], Duration::from_secs(1)).unwrap();
    dispatcher.pump(Duration::from_millis(200)).unwrap();

    assert_eq!(request.recv(Duration::from_millis(200)).unwrap().and_then(|v| v.as_str().map(str::to_string)), Some("fr-CA".to_string()));
}

/// Scenario 6 — stateful pin: after CONNECT, every REQUEST on that session
/// targets the one worker whose STATUS 200 pinned `remote_id`, even when a
/// second worker is registered for the same service and would otherwise be
/// a round-robin candidate.
#[test]
fn scenario_6_stateful_pin_to_one_worker() {
    let broker = LoopbackBroker::new();
    let mut d1 = worker_for(&broker, "math", "w1");
    let mut d2 = worker_for(&broker, "math", "w2");

    let session = Session::open("math", Box::new(broker.connect("client")), "", "en-US", 0).unwrap();
    Session::connect(&session).unwrap();

    // Round-robin starts at index 0, so the CONNECT lands on whichever
    // dispatcher registered first: `d1`.
    assert!(d1.pump(Duration::from_millis(200)).unwrap(), "d1 should have received the CONNECT");
    assert!(!d2.pump(Duration::from_millis(50)).unwrap(), "d2 must not see the CONNECT meant for d1");

    session.borrow_mut().pump(Duration::from_millis(200)).unwrap();
    assert_eq!(session.borrow().state(), SessionState::Connected);

    for n in 0..3u32 {
        let request = Session::request(
            &session,
            "add",
            vec![Value::from(i64::from(n)), Value::from(1i64)],
            Duration::from_secs(1),
        )
        .unwrap();
        assert!(d1.pump(Duration::from_millis(200)).unwrap(), "request {n} must land on the pinned worker d1");
        assert!(!d2.pump(Duration::from_millis(20)).unwrap(), "request {n} must never reach d2");
        assert_eq!(request.recv(Duration::from_millis(200)).unwrap().and_then(|v| v.as_u64()), Some(u64::from(n) + 1));
    }
}
