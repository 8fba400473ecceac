use reqwest::{Client, Response, header};
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Mock browser client for integration testing
///
/// Redirects are not followed so tests can inspect them. Cookies are tracked
/// by hand because the test server speaks plain HTTP and the session cookie is
/// marked `Secure`.
pub struct MockBrowser {
    client: Client,
    base_url: String,
    cookies: Mutex<BTreeMap<String, String>>,
}

impl MockBrowser {
    pub fn new(base_url: &str) -> Self {
        let client = Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap();

        Self {
            client,
            base_url: base_url.to_string(),
            cookies: Mutex::new(BTreeMap::new()),
        }
    }

    pub async fn get(&self, path: &str) -> Result<Response, reqwest::Error> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.with_cookies(self.client.get(&url)).send().await?;
        self.store_cookies(&response);
        Ok(response)
    }

    pub async fn post_form(
        &self,
        path: &str,
        form_data: &[(&str, &str)],
    ) -> Result<Response, reqwest::Error> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .with_cookies(self.client.post(&url).form(form_data))
            .send()
            .await?;
        self.store_cookies(&response);
        Ok(response)
    }

    pub fn cookie(&self, name: &str) -> Option<String> {
        self.cookies.lock().unwrap().get(name).cloned()
    }

    fn with_cookies(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let cookies = self.cookies.lock().unwrap();
        if cookies.is_empty() {
            return request;
        }
        let header_value = cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ");
        request.header(header::COOKIE, header_value)
    }

    fn store_cookies(&self, response: &Response) {
        let mut cookies = self.cookies.lock().unwrap();
        for value in response.headers().get_all(header::SET_COOKIE) {
            let Ok(value) = value.to_str() else { continue };
            let mut parts = value.split(';').map(str::trim);
            let Some((name, cookie_value)) = parts.next().and_then(|p| p.split_once('=')) else {
                continue;
            };
            if parts.any(|attr| attr.eq_ignore_ascii_case("Max-Age=0")) {
                cookies.remove(name);
            } else {
                cookies.insert(name.to_string(), cookie_value.to_string());
            }
        }
    }
}

/// `Location` header of a redirect response
pub fn location(response: &Response) -> Option<String> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// All `Set-Cookie` header values of a response
pub fn set_cookies(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(str::to_string)
        .collect()
}
