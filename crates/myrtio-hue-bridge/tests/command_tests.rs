//! Integration tests for the per-device HTTP endpoints.

mod common;

use common::{FakeLight, bridge, get, put, running_bridge, send};
use myrtio_hue_bridge::LightState;

// -----------------------------------------------------------------------------
// Describe
// -----------------------------------------------------------------------------

#[test]
fn get_device_returns_descriptor() {
    let light = FakeLight::new(LightState::on().with_brightness(80));
    let bridge = running_bridge(&[("Lamp", &light)]);

    let response = get(&bridge.command_server(), "/device/1");

    assert_eq!(response.status, 200);
    assert_eq!(response.header("Content-Type"), Some("application/json"));
    assert_eq!(response.header("Connection"), Some("close"));
    assert_eq!(
        response.body,
        concat!(
            r#"{"id":1,"name":"Lamp","uniqueid":"aa:bb:cc:dd:ee:ff:00:01-0b","#,
            r#""uuid":"2f402f80-da50-0001-9b23-aabbccddeeff","#,
            r#""url":"http://192.168.1.50:80/device/1","#,
            r#""state":{"on":true,"brightness":80}}"#
        )
    );
}

#[test]
fn query_string_is_ignored() {
    let light = FakeLight::default();
    let bridge = running_bridge(&[("Lamp", &light)]);

    let response = get(&bridge.command_server(), "/device/1?verbose=1");

    assert_eq!(response.status, 200);
}

#[test]
fn unknown_device_is_404() {
    let light = FakeLight::default();
    let bridge = running_bridge(&[("Lamp", &light)]);
    let server = bridge.command_server();

    let response = get(&server, "/device/7");
    assert_eq!(response.status, 404);
    assert_eq!(response.body, r#"{"error":"not_found"}"#);

    assert_eq!(get(&server, "/device/lamp").status, 404);
    assert_eq!(get(&server, "/nothing/here").status, 404);
}

// -----------------------------------------------------------------------------
// Commands
// -----------------------------------------------------------------------------

#[test]
fn set_brightness_then_describe_is_consistent() {
    let light = FakeLight::default();
    let bridge = running_bridge(&[("Lamp", &light)]);
    let server = bridge.command_server();

    let response = put(
        &server,
        "/device/1",
        r#"{"command":"set_brightness","level":42}"#,
    );
    assert_eq!(response.status, 200);
    assert_eq!(response.body, r#"{"on":true,"brightness":42}"#);

    let response = get(&server, "/device/1");
    assert!(response.body.ends_with(r#""state":{"on":true,"brightness":42}}"#));
    assert_eq!(light.state(), LightState::on().with_brightness(42));
}

#[test]
fn post_is_accepted_like_put() {
    let light = FakeLight::default();
    let bridge = running_bridge(&[("Lamp", &light)]);
    let body = r#"{"command":"turn_on"}"#;

    let response = send(
        &bridge.command_server(),
        &format!(
            "POST /device/1 HTTP/1.1\r\nContent-Length: {}\r\n\r\n{body}",
            body.len()
        ),
    );

    assert_eq!(response.status, 200);
    assert_eq!(response.body, r#"{"on":true}"#);
}

#[test]
fn out_of_range_level_is_400_without_side_effects() {
    let light = FakeLight::default();
    let bridge = running_bridge(&[("Lamp", &light)]);

    let response = put(
        &bridge.command_server(),
        "/device/1",
        r#"{"command":"set_brightness","level":150}"#,
    );

    assert_eq!(response.status, 400);
    assert_eq!(response.body, r#"{"error":"invalid_range"}"#);
    assert_eq!(light.writes(), 0);
}

#[test]
fn negative_level_is_out_of_range() {
    let light = FakeLight::new(LightState::on().with_brightness(30));
    let bridge = running_bridge(&[("Lamp", &light)]);

    let response = put(
        &bridge.command_server(),
        "/device/1",
        r#"{"command":"set_brightness","level":-5}"#,
    );

    assert_eq!(response.status, 400);
    assert_eq!(response.body, r#"{"error":"invalid_range"}"#);
    assert_eq!(light.writes(), 0);
    assert_eq!(light.state(), LightState::on().with_brightness(30));
}

#[test]
fn malformed_body_is_400() {
    let light = FakeLight::default();
    let bridge = running_bridge(&[("Lamp", &light)]);
    let server = bridge.command_server();

    let response = put(&server, "/device/1", r#"{"command":"#);
    assert_eq!(response.status, 400);
    assert_eq!(response.body, r#"{"error":"malformed_request"}"#);

    let response = put(&server, "/device/1", r#"{"command":"dance"}"#);
    assert_eq!(response.status, 400);

    let response = send(&server, "PUT /device/1 HTTP/1.1\r\n\r\n");
    assert_eq!(response.status, 400);
}

#[test]
fn hardware_failure_is_503_and_state_unchanged() {
    let light = FakeLight::default();
    let bridge = running_bridge(&[("Lamp", &light)]);
    let server = bridge.command_server();
    light.set_failing(true);

    let response = put(&server, "/device/1", r#"{"command":"turn_on"}"#);
    assert_eq!(response.status, 503);
    assert_eq!(response.body, r#"{"error":"hardware_unavailable"}"#);

    let response = get(&server, "/device/1");
    assert!(response.body.ends_with(r#""state":{"on":false}}"#));
}

#[test]
fn commands_only_touch_the_addressed_device() {
    let kitchen = FakeLight::default();
    let hall = FakeLight::default();
    let bridge = running_bridge(&[("Kitchen", &kitchen), ("Hall", &hall)]);

    let response = put(&bridge.command_server(), "/device/2", r#"{"command":"turn_on"}"#);

    assert_eq!(response.status, 200);
    assert!(hall.state().is_on);
    assert!(!kitchen.state().is_on);
    assert_eq!(kitchen.writes(), 0);
}

// -----------------------------------------------------------------------------
// Protocol errors
// -----------------------------------------------------------------------------

#[test]
fn unsupported_method_is_405() {
    let light = FakeLight::default();
    let bridge = running_bridge(&[("Lamp", &light)]);

    let response = send(
        &bridge.command_server(),
        "DELETE /device/1 HTTP/1.1\r\n\r\n",
    );

    assert_eq!(response.status, 405);
}

#[test]
fn garbage_request_line_is_400() {
    let light = FakeLight::default();
    let bridge = running_bridge(&[("Lamp", &light)]);

    let response = send(&bridge.command_server(), "HELLO\r\n\r\n");

    assert_eq!(response.status, 400);
}

#[test]
fn oversized_request_is_413() {
    let light = FakeLight::default();
    let bridge = running_bridge(&[("Lamp", &light)]);
    let server = bridge.command_server();

    let long_header = "x".repeat(600);
    let response = send(
        &server,
        &format!("GET /device/1 HTTP/1.1\r\nX-Padding: {long_header}\r\n\r\n"),
    );
    assert_eq!(response.status, 413);

    let response = send(
        &server,
        "PUT /device/1 HTTP/1.1\r\nContent-Length: 4096\r\n\r\n{}",
    );
    assert_eq!(response.status, 413);
}

#[test]
fn requests_are_refused_unless_running() {
    let light = FakeLight::default();
    let bridge = bridge(&[("Lamp", &light)]);

    let response = put(&bridge.command_server(), "/device/1", r#"{"command":"turn_on"}"#);

    assert_eq!(response.status, 503);
    assert_eq!(response.body, r#"{"error":"not_running"}"#);
    assert_eq!(light.writes(), 0);
}
