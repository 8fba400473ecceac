use reqwest::StatusCode;

use crate::common::mock_browser::{location, set_cookies};
use crate::common::{MockBrowser, TestServer};

const EMAIL: &str = "alice@example.com";
const PASSWORD: &str = "Secret123";
const COOKIE: &str = "__Host-AccountSession";

/// Sign up and confirm `email` with `PASSWORD`
async fn register_confirmed(
    server: &TestServer,
    browser: &MockBrowser,
    email: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let response = browser
        .post_form("/Accounts/Signup", &[("Email", email), ("Password", PASSWORD)])
        .await?;
    assert_eq!(response.status(), StatusCode::FOUND);

    let code = server.confirmation_code(email).await;
    let response = browser
        .post_form("/Accounts/Confirm", &[("Email", email), ("Code", &code)])
        .await?;
    assert_eq!(response.status(), StatusCode::FOUND);
    Ok(())
}

#[tokio::test]
async fn test_signup_confirm_login_signout_flow() -> Result<(), Box<dyn std::error::Error>> {
    let server = TestServer::start().await?;
    let browser = MockBrowser::new(&server.base_url);

    // Signup redirects to the confirmation step with the email prefilled
    let response = browser
        .post_form("/Accounts/Signup", &[("Email", EMAIL), ("Password", PASSWORD)])
        .await?;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        location(&response).as_deref(),
        Some("/Accounts/Confirm?Email=alice%40example.com")
    );

    let response = browser.get("/Accounts/Confirm?Email=alice%40example.com").await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.text().await?.contains(r#"value="alice@example.com""#));

    // Confirmation lands on the home page
    let code = server.confirmation_code(EMAIL).await;
    assert_eq!(code.len(), 6);
    let response = browser
        .post_form("/Accounts/Confirm", &[("Email", EMAIL), ("Code", &code)])
        .await?;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response).as_deref(), Some("/Home/Index"));

    // Login sets a browsing-session cookie and redirects home
    let response = browser
        .post_form("/Accounts/Login", &[("Email", EMAIL), ("Password", PASSWORD)])
        .await?;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response).as_deref(), Some("/Home/Index"));
    let cookies = set_cookies(&response);
    assert_eq!(cookies.len(), 1);
    assert!(cookies[0].starts_with(&format!("{COOKIE}=")));
    assert!(cookies[0].contains("HttpOnly"));
    assert!(cookies[0].contains("Secure"));
    assert!(!cookies[0].contains("Max-Age"));
    assert!(browser.cookie(COOKIE).is_some());

    // Authenticated callers skip the login form
    let response = browser.get("/Accounts/Login").await?;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response).as_deref(), Some("/Home/Index"));

    // Signout clears the cookie and ends the session
    let response = browser.post_form("/Accounts/Signout", &[]).await?;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response).as_deref(), Some("/Accounts/Login"));
    assert!(set_cookies(&response)[0].ends_with("Max-Age=0"));
    assert!(browser.cookie(COOKIE).is_none());

    let response = browser.get("/Accounts/Login").await?;
    assert_eq!(response.status(), StatusCode::OK);

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn test_revoked_session_cookie_is_not_honoured() -> Result<(), Box<dyn std::error::Error>> {
    // Given a session that has been signed out
    let server = TestServer::start().await?;
    let browser = MockBrowser::new(&server.base_url);
    register_confirmed(&server, &browser, EMAIL).await?;

    browser
        .post_form("/Accounts/Login", &[("Email", EMAIL), ("Password", PASSWORD)])
        .await?;
    let stale = browser.cookie(COOKIE).expect("session cookie");
    browser.get("/Accounts/Signout").await?;

    // Replaying the old cookie after signout yields the login form again
    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()?;
    let response = client
        .get(format!("{}/Accounts/Login", server.base_url))
        .header(reqwest::header::COOKIE, format!("{COOKIE}={stale}"))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn test_remember_me_persists_cookie() -> Result<(), Box<dyn std::error::Error>> {
    let server = TestServer::start().await?;
    let browser = MockBrowser::new(&server.base_url);
    register_confirmed(&server, &browser, EMAIL).await?;

    let response = browser
        .post_form(
            "/Accounts/Login",
            &[("Email", EMAIL), ("Password", PASSWORD), ("RememberMe", "true")],
        )
        .await?;
    assert_eq!(response.status(), StatusCode::FOUND);
    let cookies = set_cookies(&response);
    assert!(cookies[0].contains("Max-Age="));

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn test_unrecognised_remember_value_signs_in_without_persisting()
-> Result<(), Box<dyn std::error::Error>> {
    // Given a confirmed account
    let server = TestServer::start().await?;
    let browser = MockBrowser::new(&server.base_url);
    register_confirmed(&server, &browser, EMAIL).await?;

    // When the checkbox arrives with a value it does not know
    let response = browser
        .post_form(
            "/Accounts/Login",
            &[("Email", EMAIL), ("Password", PASSWORD), ("RememberMe", "yes")],
        )
        .await?;

    // Then sign-in goes through with a browsing-session cookie
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response).as_deref(), Some("/Home/Index"));
    let cookies = set_cookies(&response);
    assert_eq!(cookies.len(), 1);
    assert!(!cookies[0].contains("Max-Age"));

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn test_unbindable_form_is_redisplayed() -> Result<(), Box<dyn std::error::Error>> {
    let server = TestServer::start().await?;
    let browser = MockBrowser::new(&server.base_url);

    // A field submitted twice cannot be bound
    let response = browser
        .post_form(
            "/Accounts/Login",
            &[
                ("Email", EMAIL),
                ("Password", PASSWORD),
                ("RememberMe", "true"),
                ("RememberMe", "false"),
            ],
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookies(&response).is_empty());
    let body = response.text().await?;
    assert!(body.contains(r#"data-key="Form""#));
    assert!(!body.contains("deserialize"));

    // So does a body that is not form-encoded
    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()?;
    for path in ["/Accounts/Signup", "/Accounts/Confirm"] {
        let response = client
            .post(format!("{}{path}", server.base_url))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(r#"{"Email":"alice@example.com"}"#)
            .send()
            .await?;
        assert_eq!(response.status(), StatusCode::OK, "path: {path}");
        assert!(
            response.text().await?.contains(r#"data-key="Form""#),
            "path: {path}"
        );
    }

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn test_signup_existing_user_redisplays() -> Result<(), Box<dyn std::error::Error>> {
    let server = TestServer::start().await?;
    let browser = MockBrowser::new(&server.base_url);
    register_confirmed(&server, &browser, EMAIL).await?;

    let response = browser
        .post_form("/Accounts/Signup", &[("Email", EMAIL), ("Password", PASSWORD)])
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await?;
    assert!(body.contains("User with this email already exists"));
    assert!(body.contains(r#"value="alice@example.com""#));
    assert!(!body.contains(PASSWORD));

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn test_signup_weak_password_lists_provider_errors() -> Result<(), Box<dyn std::error::Error>>
{
    let server = TestServer::start().await?;
    let browser = MockBrowser::new(&server.base_url);

    let response = browser
        .post_form("/Accounts/Signup", &[("Email", EMAIL), ("Password", "short")])
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await?;
    assert!(body.matches(r#"data-key="InvalidPassword""#).count() >= 2);

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn test_signup_validation_errors() -> Result<(), Box<dyn std::error::Error>> {
    let server = TestServer::start().await?;
    let browser = MockBrowser::new(&server.base_url);

    let response = browser.post_form("/Accounts/Signup", &[]).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await?;
    assert!(body.contains("The Email field is required."));
    assert!(body.contains("The Password field is required."));

    let response = browser
        .post_form(
            "/Accounts/Signup",
            &[("Email", "<script>@x"), ("Password", PASSWORD)],
        )
        .await?;
    let body = response.text().await?;
    assert!(body.contains("not a valid e-mail address"));
    assert!(!body.contains("<script>"));

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn test_confirm_unknown_account() -> Result<(), Box<dyn std::error::Error>> {
    let server = TestServer::start().await?;
    let browser = MockBrowser::new(&server.base_url);

    let response = browser
        .post_form(
            "/Accounts/Confirm",
            &[("Email", "nobody@example.com"), ("Code", "123456")],
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await?;
    assert!(body.contains("A user with the given email address was not found"));
    assert!(body.contains(r#"value="123456""#));

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn test_confirm_wrong_code() -> Result<(), Box<dyn std::error::Error>> {
    let server = TestServer::start().await?;
    let browser = MockBrowser::new(&server.base_url);
    browser
        .post_form("/Accounts/Signup", &[("Email", EMAIL), ("Password", PASSWORD)])
        .await?;

    let code = server.confirmation_code(EMAIL).await;
    let wrong = if code == "000000" { "111111" } else { "000000" };
    let response = browser
        .post_form("/Accounts/Confirm", &[("Email", EMAIL), ("Code", wrong)])
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.text().await?.contains(r#"data-key="CodeMismatch""#));

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() -> Result<(), Box<dyn std::error::Error>> {
    // Given a confirmed account
    let server = TestServer::start().await?;
    let browser = MockBrowser::new(&server.base_url);
    register_confirmed(&server, &browser, EMAIL).await?;

    // When logging in with a wrong password and with an unknown email
    let wrong_password = browser
        .post_form("/Accounts/Login", &[("Email", EMAIL), ("Password", "Wrong123")])
        .await?;
    assert_eq!(wrong_password.status(), StatusCode::OK);
    assert!(set_cookies(&wrong_password).is_empty());
    let wrong_password = wrong_password.text().await?;

    let unknown = browser
        .post_form(
            "/Accounts/Login",
            &[("Email", "bob@example.com"), ("Password", "Wrong123")],
        )
        .await?;
    assert_eq!(unknown.status(), StatusCode::OK);
    let unknown = unknown.text().await?;

    // Then both pages are identical apart from the echoed email
    assert!(wrong_password.contains("Email and password do not match"));
    assert_eq!(
        wrong_password.replace(EMAIL, "EMAIL"),
        unknown.replace("bob@example.com", "EMAIL")
    );

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn test_login_unconfirmed_account_is_refused() -> Result<(), Box<dyn std::error::Error>> {
    let server = TestServer::start().await?;
    let browser = MockBrowser::new(&server.base_url);
    browser
        .post_form("/Accounts/Signup", &[("Email", EMAIL), ("Password", PASSWORD)])
        .await?;

    let response = browser
        .post_form("/Accounts/Login", &[("Email", EMAIL), ("Password", PASSWORD)])
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .text()
            .await?
            .contains("Email and password do not match")
    );

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn test_signout_anonymous_is_idempotent() -> Result<(), Box<dyn std::error::Error>> {
    let server = TestServer::start().await?;
    let browser = MockBrowser::new(&server.base_url);

    for _ in 0..2 {
        let response = browser.get("/Accounts/Signout").await?;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(location(&response).as_deref(), Some("/Accounts/Login"));

        let response = browser.post_form("/Accounts/Signout", &[]).await?;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(location(&response).as_deref(), Some("/Accounts/Login"));
    }

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn test_empty_forms_render() -> Result<(), Box<dyn std::error::Error>> {
    let server = TestServer::start().await?;
    let browser = MockBrowser::new(&server.base_url);

    for path in ["/Accounts/Signup", "/Accounts/Confirm", "/Accounts/Login"] {
        let response = browser.get(path).await?;
        assert_eq!(response.status(), StatusCode::OK, "path: {path}");
        let body = response.text().await?;
        assert!(body.contains(&format!(r#"action="{path}""#)), "path: {path}");
        assert!(!body.contains("validation-summary"), "path: {path}");
    }

    server.shutdown().await;
    Ok(())
}
