//! A recording stand-in for the host's native request object.

use std::sync::Mutex;

use xhr_hook::{Event, NativeRequest, Url, Value};

pub const NETWORK_BODY: &str = "from the network";

#[derive(Debug, Default)]
pub struct Recorded {
    pub opened: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub sent: Vec<Value>,
    pub aborts: usize,
    pub events: Vec<Event>,
    pub response_type: String,
    pub base_url: Option<Url>,
    ready_state: u16,
    status: u16,
    body: String,
}

/// Behaves like a host request object whose network always answers
/// `200 OK` with `NETWORK_BODY`, synchronously.
#[derive(Debug, Default)]
pub struct FakeXhr {
    rec: Mutex<Recorded>,
}

impl FakeXhr {
    pub fn new() -> FakeXhr {
        let fake = FakeXhr::default();
        fake.rec.lock().unwrap().base_url = Some(Url::parse(super::BASE).unwrap());
        fake
    }

    pub fn with_response_type(self, kind: &str) -> FakeXhr {
        self.rec.lock().unwrap().response_type = kind.to_owned();
        self
    }

    pub fn without_base_url(self) -> FakeXhr {
        self.rec.lock().unwrap().base_url = None;
        self
    }

    pub fn set_response_type(&self, kind: &str) {
        self.rec.lock().unwrap().response_type = kind.to_owned();
    }

    pub fn events(&self) -> Vec<Event> {
        self.rec.lock().unwrap().events.clone()
    }

    pub fn event_names(&self) -> Vec<&'static str> {
        self.events().iter().map(Event::name).collect()
    }

    pub fn clear_events(&self) {
        self.rec.lock().unwrap().events.clear();
    }

    pub fn sent(&self) -> Vec<Value> {
        self.rec.lock().unwrap().sent.clone()
    }

    pub fn opened(&self) -> Vec<(String, String)> {
        self.rec.lock().unwrap().opened.clone()
    }

    pub fn headers(&self) -> Vec<(String, String)> {
        self.rec.lock().unwrap().headers.clone()
    }

    pub fn aborts(&self) -> usize {
        self.rec.lock().unwrap().aborts
    }
}

impl NativeRequest for FakeXhr {
    fn open(&self, method: &str, url: &str) {
        let mut rec = self.rec.lock().unwrap();
        rec.opened.push((method.to_owned(), url.to_owned()));
        rec.headers.clear();
        rec.ready_state = 1;
        rec.status = 0;
        rec.body.clear();
    }

    fn set_request_header(&self, name: &str, value: &str) {
        self.rec
            .lock()
            .unwrap()
            .headers
            .push((name.to_owned(), value.to_owned()));
    }

    fn send(&self, body: Value) {
        {
            let mut rec = self.rec.lock().unwrap();
            rec.sent.push(body);
            rec.ready_state = 4;
            rec.status = 200;
            rec.body = NETWORK_BODY.to_owned();
        }
        self.dispatch_event(Event::Load);
        self.dispatch_event(Event::ReadyStateChange);
        self.dispatch_event(Event::LoadEnd);
    }

    fn abort(&self) {
        self.rec.lock().unwrap().aborts += 1;
    }

    fn get_all_response_headers(&self) -> String {
        if self.rec.lock().unwrap().status == 0 {
            String::new()
        } else {
            "content-type: text/plain".to_owned()
        }
    }

    fn ready_state(&self) -> u16 {
        self.rec.lock().unwrap().ready_state
    }

    fn status(&self) -> u16 {
        self.rec.lock().unwrap().status
    }

    fn status_text(&self) -> String {
        match self.status() {
            0 => String::new(),
            _ => "OK".to_owned(),
        }
    }

    fn response(&self) -> Value {
        Value::String(self.rec.lock().unwrap().body.clone())
    }

    fn response_url(&self) -> String {
        String::new()
    }

    fn response_text(&self) -> String {
        self.rec.lock().unwrap().body.clone()
    }

    fn response_type(&self) -> String {
        self.rec.lock().unwrap().response_type.clone()
    }

    fn base_url(&self) -> Option<Url> {
        self.rec.lock().unwrap().base_url.clone()
    }

    fn dispatch_event(&self, event: Event) {
        self.rec.lock().unwrap().events.push(event);
    }
}
