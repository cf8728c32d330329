//! API integration tests
//!
//! Start the server against a scratch database, then run with
//! `cargo test -- --ignored`.

use std::time::{SystemTime, UNIX_EPOCH};

use reqwest::{redirect::Policy, Client, StatusCode};
use serde_json::Value;

const BASE_URL: &str = "http://localhost:8080";

/// Client that reports redirects instead of following them
fn client() -> Client {
    Client::builder()
        .redirect(Policy::none())
        .build()
        .expect("Failed to build client")
}

/// Suffix keeping the records of one run apart from earlier runs
fn unique() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Clock before epoch")
        .as_nanos();
    format!("{:x}", nanos)
}

async fn get_json(client: &Client, path: &str) -> (StatusCode, Value) {
    let response = client
        .get(format!("{}{}", BASE_URL, path))
        .send()
        .await
        .expect("Failed to send request");
    let status = response.status();
    let body = response.json().await.expect("Failed to parse response");
    (status, body)
}

async fn post_form(client: &Client, path: &str, form: &[(&str, &str)]) -> reqwest::Response {
    client
        .post(format!("{}{}", BASE_URL, path))
        .form(form)
        .send()
        .await
        .expect("Failed to send request")
}

fn assert_redirect(response: &reqwest::Response, location: &str) {
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()["location"], location);
}

/// Create a book and return its id
async fn create_book(client: &Client, title: &str, author: &str) -> i64 {
    let response = post_form(client, "/books/new", &[("title", title), ("author", author)]).await;
    assert_redirect(&response, "/books");

    let (_, page) = get_json(client, &format!("/books?search={}", title)).await;
    page["rows"][0]["id"].as_i64().expect("Book not listed")
}

/// Create a patron and return their id and library card number
async fn create_patron(client: &Client, first_name: &str, email: &str) -> (i64, String) {
    let response = post_form(
        client,
        "/patrons/new",
        &[
            ("first_name", first_name),
            ("last_name", "Reader"),
            ("email", email),
            ("library_id", "ignored"),
        ],
    )
    .await;
    assert_redirect(&response, "/patrons");

    let (_, page) = get_json(client, &format!("/patrons?search={}", first_name)).await;
    let patron = &page["rows"][0];
    (
        patron["id"].as_i64().expect("Patron not listed"),
        patron["library_id"].as_str().unwrap_or_default().to_string(),
    )
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let (status, body) = get_json(&client(), "/health").await;
    assert!(status.is_success());
    assert_eq!(body["status"], "healthy");

    let (status, body) = get_json(&client(), "/ready").await;
    assert!(status.is_success());
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
#[ignore]
async fn test_root_redirects_to_books() {
    let response = client()
        .get(format!("{}/", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert_redirect(&response, "/books");
}

#[tokio::test]
#[ignore]
async fn test_book_search_and_update() {
    let client = client();
    let title = format!("Dune-{}", unique());
    let id = create_book(&client, &title, "Herbert").await;

    let (status, page) = get_json(&client, &format!("/books?search={}", title.to_uppercase())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 1);
    assert_eq!(page["totalPages"], 1);
    assert_eq!(page["hasNext"], false);

    // Blank title: errors shown, persisted title kept in the form
    let response = post_form(&client, &format!("/books/{}", id), &[("title", ""), ("author", "F. Herbert")]).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let view: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(view["errors"][0], "Title is required");
    assert_eq!(view["record"]["title"], title.as_str());
    assert_eq!(view["record"]["author"], "F. Herbert");

    let response = post_form(
        &client,
        &format!("/books/{}", id),
        &[("title", title.as_str()), ("author", "Frank Herbert"), ("first_published", "1965")],
    )
    .await;
    assert_redirect(&response, "/books");

    let (_, view) = get_json(&client, &format!("/books/{}", id)).await;
    assert_eq!(view["record"]["author"], "Frank Herbert");
    assert_eq!(view["record"]["first_published"], "1965");
}

#[tokio::test]
#[ignore]
async fn test_missing_records_are_not_found() {
    let (status, body) = get_json(&client(), "/books/2147483647").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["message"].is_string());

    let (status, _) = get_json(&client(), "/loans/2147483647/return").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore]
async fn test_patron_validation() {
    let client = client();
    let response = post_form(
        &client,
        "/patrons/new",
        &[("first_name", ""), ("last_name", "Reader"), ("email", "nope"), ("zip_code", "12a")],
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let view: Value = response.json().await.expect("Failed to parse response");
    let errors: Vec<&str> = view["errors"]
        .as_array()
        .expect("No errors")
        .iter()
        .filter_map(Value::as_str)
        .collect();
    assert_eq!(errors[0], "First Name is required");
    assert!(errors.contains(&"Please enter a valid email address"));
    assert!(errors.contains(&"Zip Code must be a number"));
    assert!(!view["record"]["library_id"].as_str().unwrap_or_default().is_empty());
}

#[tokio::test]
#[ignore]
async fn test_library_ids_increase() {
    let client = client();
    let run = unique();
    let (_, first) = create_patron(&client, &format!("Ada{}", run), "ada@example.com").await;
    let (_, second) = create_patron(&client, &format!("Alan{}", run), "alan@example.com").await;

    let first: i64 = first.parse().expect("Non numeric library id");
    let second: i64 = second.parse().expect("Non numeric library id");
    assert!(second > first);
}

#[tokio::test]
#[ignore]
async fn test_checkout_and_return() {
    let client = client();
    let run = unique();
    let book_id = create_book(&client, &format!("Dune-{}", run), "Herbert").await.to_string();
    let (patron_id, _) = create_patron(&client, &format!("Paul{}", run), "paul@example.com").await;
    let patron_id = patron_id.to_string();

    let (_, form) = get_json(&client, "/loans/new").await;
    assert!(form["books"]
        .as_array()
        .expect("No books")
        .iter()
        .any(|b| b["id"].to_string() == book_id));

    let response = post_form(&client, "/loans/new", &[("book_id", book_id.as_str()), ("patron_id", patron_id.as_str())]).await;
    assert_redirect(&response, "/loans");

    // Second checkout of the same book
    let response = post_form(&client, "/loans/new", &[("book_id", book_id.as_str()), ("patron_id", patron_id.as_str())]).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let view: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(view["errors"][0], "This book is checked out.");

    let (_, patron) = get_json(&client, &format!("/patrons/{}", patron_id)).await;
    assert_eq!(patron["loans"]["total"], 1);
    let loan = &patron["loans"]["rows"][0];
    let loan_id = loan["id"].as_i64().expect("No loan id");
    assert!(loan["returned_on"].is_null());

    let loaned_on = chrono::NaiveDate::parse_from_str(loan["loaned_on"].as_str().unwrap_or_default(), "%Y-%m-%d")
        .expect("Bad loaned_on");
    let return_by = chrono::NaiveDate::parse_from_str(loan["return_by"].as_str().unwrap_or_default(), "%Y-%m-%d")
        .expect("Bad return_by");
    assert_eq!((return_by - loaned_on).num_days(), 7);

    let (status, _) = get_json(&client, &format!("/loans/{}/return", loan_id)).await;
    assert_eq!(status, StatusCode::OK);

    let response = post_form(&client, &format!("/loans/{}/return", loan_id), &[("returned_on", "")]).await;
    assert_redirect(&response, "/loans");

    let response = post_form(&client, &format!("/loans/{}/return", loan_id), &[("returned_on", "")]).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let view: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(view["errors"][0], "This loan has already been returned");

    // The book can be lent again
    let response = post_form(&client, "/loans/new", &[("book_id", book_id.as_str()), ("patron_id", patron_id.as_str())]).await;
    assert_redirect(&response, "/loans");
}

#[tokio::test]
#[ignore]
async fn test_loan_requires_choices() {
    let response = post_form(&client(), "/loans/new", &[("book_id", ""), ("patron_id", "")]).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let view: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(view["errors"][0], "Please select a book to loan");
    assert_eq!(view["errors"][1], "Please select a patron for the loan");
}

#[tokio::test]
#[ignore]
async fn test_duplicate_library_id_rerenders_form() {
    let client = client();
    let run = unique();
    let (_, taken) = create_patron(&client, &format!("Grace{}", run), "grace@example.com").await;
    let (id, _) = create_patron(&client, &format!("Edsger{}", run), "edsger@example.com").await;

    let response = post_form(
        &client,
        &format!("/patrons/{}", id),
        &[
            ("first_name", format!("Edsger{}", run).as_str()),
            ("last_name", "Reader"),
            ("email", "edsger@example.com"),
            ("library_id", taken.as_str()),
        ],
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let view: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(view["errors"][0], "Library ID must be unique");
    assert_eq!(view["fieldErrors"]["library_id"][0], "Library ID must be unique");
}

#[tokio::test]
#[ignore]
async fn test_loan_of_unknown_book_is_not_found() {
    let client = client();
    let (patron_id, _) = create_patron(&client, &format!("Nobody{}", unique()), "nobody@example.com").await;
    let patron_id = patron_id.to_string();

    let response = post_form(&client, "/loans/new", &[("book_id", "2147483647"), ("patron_id", patron_id.as_str())]).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["message"], "Book 2147483647 not found");
}

#[tokio::test]
#[ignore]
async fn test_non_numeric_ids_are_not_found() {
    let client = client();
    for path in ["/books/abc", "/patrons/abc", "/loans/abc/return"] {
        let (status, body) = get_json(&client, path).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", path);
        assert_eq!(body["error"], "NoSuchData");
    }
}
