//! Minimal HTML rendering. Every interpolated value goes through `escape`.

use axum::http::StatusCode;
use axum::response::Html;
use std::fmt::Write;

use crate::db::DbBook;
use crate::types::pages::{BookPage, UserPage};

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, body: &str) -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>Libris: {title}</title></head>
<body>
<nav><a href="/">Home</a> | <a href="/users">My reviews</a> | <a href="/logout">Log out</a></nav>
<main>
{body}
</main>
</body>
</html>"#,
        title = escape(title),
    ))
}

fn search_form(query: &str) -> String {
    format!(
        r#"<form action="/search" method="get">
<input name="q" placeholder="ISBN, title or author" value="{}"><button type="submit">Search</button>
</form>"#,
        escape(query)
    )
}

fn stars(rating: i64) -> String {
    let r = rating.clamp(0, 5) as usize;
    format!("{}{}", "★".repeat(r), "☆".repeat(5 - r))
}

pub fn error_page(status: StatusCode, message: &str) -> Html<String> {
    layout(
        "Error",
        &format!(
            "<h1>{}</h1>\n<p class=\"error\">{}</p>",
            status.as_u16(),
            escape(message)
        ),
    )
}

pub fn login_page() -> Html<String> {
    layout(
        "Log in",
        r#"<h1>Log in</h1>
<form action="/login" method="post">
<input name="username" placeholder="Username" autocomplete="username">
<input name="password" type="password" placeholder="Password">
<button type="submit">Log in</button>
</form>
<p>No account? <a href="/register">Register</a></p>"#,
    )
}

pub fn register_page() -> Html<String> {
    layout(
        "Register",
        r#"<h1>Register</h1>
<form action="/register" method="post">
<input name="username" placeholder="Username" autocomplete="username">
<input name="password" type="password" placeholder="Password">
<input name="confirmation" type="password" placeholder="Confirm password">
<button type="submit">Register</button>
</form>"#,
    )
}

pub fn logout_page() -> Html<String> {
    layout(
        "Logged out",
        r#"<h1>You are logged out</h1><p><a href="/login">Log in again</a></p>"#,
    )
}

pub fn index_page(username: &str) -> Html<String> {
    layout(
        "Home",
        &format!(
            "<h1>Hello, {}!</h1>\n{}",
            escape(username),
            search_form("")
        ),
    )
}

pub fn search_page(query: &str, books: &[DbBook]) -> Html<String> {
    let mut body = format!("<h1>Search</h1>\n{}\n", search_form(query));
    if books.is_empty() {
        body.push_str("<p>No books found.</p>");
    } else {
        body.push_str("<ul>\n");
        for b in books {
            let _ = writeln!(
                body,
                r#"<li><a href="/books/{}">{}</a> by {} ({}), ISBN {}</li>"#,
                b.book_id,
                escape(&b.title),
                escape(&b.author),
                b.year,
                escape(&b.isbn)
            );
        }
        body.push_str("</ul>");
    }
    layout("Search", &body)
}

pub fn book_page(page: &BookPage) -> Html<String> {
    let b = &page.book;
    let mut body = format!(
        r#"<h1>{title}</h1>
<img src="{cover}" alt="Cover of {title}" width="128">
<p>by {author}, {year}. ISBN {isbn}</p>
"#,
        title = escape(&b.title),
        cover = escape(&page.cover_image_path),
        author = escape(&b.author),
        year = b.year,
        isbn = escape(&b.isbn),
    );

    match b.average_rating {
        Some(avg) => {
            let _ = writeln!(
                body,
                "<p>Rating here: {avg:.2} / 5 from {} review(s)</p>",
                b.review_count
            );
        }
        None => body.push_str("<p>No ratings yet</p>\n"),
    }
    if let Some(c) = page.community {
        let _ = writeln!(
            body,
            "<p>Community rating: {:.2} / 5 from {} rating(s)</p>",
            c.average_rating, c.ratings_count
        );
    }

    if page.viewer_has_reviewed {
        body.push_str("<p>You have already reviewed this book.</p>\n");
    } else {
        let _ = writeln!(
            body,
            r#"<form action="/submit_review" method="post">
<input type="hidden" name="book_id" value="{}">
<select name="rating">{}</select>
<textarea name="review" placeholder="Your review (optional)"></textarea>
<button type="submit">Submit review</button>
</form>"#,
            b.book_id,
            (1..=5)
                .map(|r| format!(r#"<option value="{r}">{r}</option>"#))
                .collect::<String>()
        );
    }

    body.push_str("<h2>Reviews</h2>\n");
    if page.reviews.is_empty() {
        body.push_str("<p>No reviews yet.</p>");
    }
    for r in &page.reviews {
        let _ = writeln!(
            body,
            r#"<article><p><a href="/users/{}">{}</a> {} <time>{}</time></p><p>{}</p></article>"#,
            r.user_id,
            escape(&r.username),
            stars(r.rating),
            r.date.format("%Y-%m-%d %H:%M"),
            escape(&r.review)
        );
    }
    layout(&b.title, &body)
}

pub fn user_page(page: &UserPage) -> Html<String> {
    let mut body = format!("<h1>{}</h1>\n", escape(&page.username));
    if page.reviews.is_empty() {
        body.push_str("<p>No reviews yet.</p>");
    }
    for r in &page.reviews {
        let _ = writeln!(
            body,
            r#"<article><p><a href="/books/{}">{}</a> {} <time>{}</time></p><p>{}</p></article>"#,
            r.book_id,
            escape(&r.title),
            stars(r.rating),
            r.date.format("%Y-%m-%d"),
            escape(&r.review)
        );
    }
    layout(&page.username, &body)
}
