use std::sync::Arc;

use async_trait::async_trait;
use hookfetch::http::header::{COOKIE, SET_COOKIE};
use hookfetch::{Hook, HookResult, Request, Url};
use reqwest::cookie::{CookieStore, Jar};
use tracing::debug;

/// Keeps a cookie jar across dispatches: sends stored cookies with every
/// request and stores `set-cookie` headers from every response.
///
/// Hooks that change the URL after this one will get cookies meant for the
/// original URL.
#[derive(Debug, Clone, Default)]
pub struct CookieHook {
    jar: Arc<Jar>,
}

impl CookieHook {
    pub fn new() -> Self { Self::default() }

    pub fn with_jar(jar: Arc<Jar>) -> Self { Self { jar } }

    pub fn jar(&self) -> &Arc<Jar> { &self.jar }
}

#[async_trait]
impl Hook for CookieHook {
    fn name(&self) -> &str { "cookies" }

    async fn call(&self, request: &Request) -> hookfetch::Result<Option<HookResult>> {
        let mut request = request.clone();
        match self.jar.cookies(request.url()) {
            Some(cookies) => {
                debug!(url = %elide_query(request.url()), "sending cookies");
                request = request.with_header(COOKIE, cookies);
            }
            None => debug!(url = %elide_query(request.url()), "no cookies"),
        }

        let jar = Arc::clone(&self.jar);
        let result = HookResult::replace(request).on_postreq(move |request, response, err| {
            let (Some(response), None) = (response, err) else {
                return Ok(());
            };
            let mut cookies = response.headers().get_all(SET_COOKIE).iter().peekable();
            if cookies.peek().is_some() {
                debug!(url = %elide_query(request.url()), "storing cookies");
                jar.set_cookies(&mut cookies, request.url());
            }
            Ok(())
        });
        Ok(Some(result))
    }
}

fn elide_query(url: &Url) -> String {
    let mut url = url.clone();
    url.set_query(None);
    url.set_fragment(None);
    url.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hookfetch::Outcome;

    #[tokio::test]
    async fn test_no_cookies_means_untouched_replacement() {
        let hook = CookieHook::new();
        let request = Request::get("https://example.com/").unwrap();
        let (outcome, listeners) = hook.call(&request).await.unwrap().unwrap().into_parts();

        let Outcome::Replace(replacement) = outcome else {
            panic!("expected a replacement request");
        };
        assert!(replacement.headers().get(COOKIE).is_none());
        assert!(listeners.postreq.is_some());
    }

    #[tokio::test]
    async fn test_stored_cookies_are_sent() {
        let hook = CookieHook::new();
        let url = Url::parse("https://example.com/").unwrap();
        hook.jar().add_cookie_str("session=abc; Path=/", &url);

        let request = Request::new(url);
        let (outcome, _) = hook.call(&request).await.unwrap().unwrap().into_parts();
        let Outcome::Replace(replacement) = outcome else {
            panic!("expected a replacement request");
        };
        assert_eq!(replacement.headers()[COOKIE], "session=abc");
    }

    #[test]
    fn test_elide_query() {
        let url = Url::parse("https://example.com/a?secret=1#frag").unwrap();
        assert_eq!(elide_query(&url), "https://example.com/a");
    }
}
