#![allow(dead_code)]

pub mod native;

use std::sync::Arc;
use std::time::Duration;

use xhr_hook::{HookRegistry, Installer, Surface, XmlHttpRequest};

use self::native::FakeXhr;

pub const BASE: &str = "https://app.test/page/";

/// A freshly patched surface dispatching to `registry`.
pub fn surface(registry: &Arc<HookRegistry>) -> Arc<Surface<XmlHttpRequest<FakeXhr>>> {
    let surface = Arc::new(XmlHttpRequest::<FakeXhr>::prototype());
    Installer::new()
        .registry(registry.clone())
        .install(&surface)
        .expect("install");
    surface
}

/// A request instance on a freshly patched surface.
pub fn xhr(registry: &Arc<HookRegistry>) -> XmlHttpRequest<FakeXhr> {
    XmlHttpRequest::new(FakeXhr::new(), surface(registry))
}

/// Waits until the instance reaches `readyState` 4.
pub async fn done(xhr: &XmlHttpRequest<FakeXhr>) {
    wait_for(|| xhr.ready_state().unwrap() == 4).await
}

pub async fn wait_for(mut cond: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .expect("condition not reached in time")
}
