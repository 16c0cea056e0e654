mod support;

use serde::Serialize;
use support::native::FakeXhr;

use xhr_hook::{HookRegistry, OnExists, Request, Responder, Response, Value, XmlHttpRequest};

fn json_xhr(body: &'static str) -> XmlHttpRequest<FakeXhr> {
    let registry = HookRegistry::new();
    registry
        .insert(
            "json",
            move |_: &Request| Some(Responder::from_response(Response::new(body))),
            OnExists::Error,
        )
        .unwrap();
    XmlHttpRequest::new(
        FakeXhr::new().with_response_type("json"),
        support::surface(&registry),
    )
}

#[tokio::test]
async fn json_response_is_parsed() {
    let _ = env_logger::try_init();

    let xhr = json_xhr(r#"{"message":"Hello"}"#);
    xhr.open("GET", "/message").unwrap();
    xhr.send(Value::Null).unwrap();
    support::done(&xhr).await;

    assert_eq!(
        xhr.response().unwrap(),
        Value::Json(serde_json::json!({ "message": "Hello" }))
    );
    assert_eq!(xhr.response_text().unwrap(), r#"{"message":"Hello"}"#);
}

#[tokio::test]
async fn malformed_json_is_null() {
    let xhr = json_xhr(r#"{"message":"#);
    xhr.open("GET", "/").unwrap();
    xhr.send(Value::Null).unwrap();
    support::done(&xhr).await;

    assert_eq!(xhr.response().unwrap(), Value::Null);
    assert_eq!(xhr.ready_state().unwrap(), 4);
}

#[tokio::test]
async fn hook_can_serialize_a_body() {
    #[derive(Serialize)]
    struct User {
        id: u32,
        name: &'static str,
    }

    let registry = HookRegistry::new();
    registry
        .insert(
            "users",
            |_: &Request| {
                let users = [User { id: 1, name: "ada" }];
                Response::json(&users).ok().map(Responder::from_response)
            },
            OnExists::Error,
        )
        .unwrap();

    let xhr = XmlHttpRequest::new(
        FakeXhr::new().with_response_type("json"),
        support::surface(&registry),
    );
    xhr.open("GET", "/users").unwrap();
    xhr.send(Value::Null).unwrap();
    support::done(&xhr).await;

    let response = xhr.response().unwrap();
    let users = response.as_json().expect("json");
    assert_eq!(users[0]["name"], "ada");
    assert!(xhr
        .get_all_response_headers()
        .unwrap()
        .contains("content-type: application/json"));
}
