//! Minimal inline views. A real deployment would swap these for a proper
//! templating layer; only the routes and the data they expose are in scope.

use axum::{
    Extension,
    response::{Html, Redirect},
};

use crate::middleware::CurrentUser;

pub async fn index() -> Redirect {
    Redirect::to("/dashboard")
}

pub async fn login_page() -> Html<&'static str> {
    Html(
        r#"<!doctype html>
<title>Log in</title>
<h1>Log in</h1>
<form method="post" action="/login">
  <input name="email" type="email" placeholder="email" required>
  <input name="password" type="password" placeholder="password" required>
  <button type="submit">Log in</button>
</form>
<p><a href="/signup-page">Sign up</a></p>"#,
    )
}

pub async fn signup_page() -> Html<&'static str> {
    Html(
        r#"<!doctype html>
<title>Sign up</title>
<h1>Sign up</h1>
<form method="post" action="/signup">
  <input name="username" placeholder="username" required>
  <input name="email" type="email" placeholder="email" required>
  <input name="password" type="password" placeholder="password" required>
  <button type="submit">Sign up</button>
</form>
<p><a href="/login-page">Log in</a></p>"#,
    )
}

pub async fn dashboard(Extension(user): Extension<CurrentUser>) -> Html<String> {
    Html(format!(
        r#"<!doctype html>
<title>Dashboard</title>
<h1>Dashboard</h1>
<p>Signed in as {}</p>
<p><a href="/my-notes">My notes</a> · <a href="/logout">Log out</a></p>"#,
        escape(&user.email)
    ))
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
