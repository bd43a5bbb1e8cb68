use std::io::Write;

use mockito::Matcher;
use newsjudge::fetcher::{read_articles_file, FetchFilter, NewsApiFetcher, NewsFetcher};

#[tokio::test]
async fn test_fetch_top_headlines_with_mock() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("GET", "/top-headlines")
        .match_header("x-api-key", "news-key")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("country".into(), "us".into()),
            Matcher::UrlEncoded("pageSize".into(), "3".into()),
            Matcher::UrlEncoded("category".into(), "science".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
                "status": "ok",
                "totalResults": 3,
                "articles": [
                    {
                        "source": {"id": null, "name": "Science Daily"},
                        "author": null,
                        "title": "Probe reaches Jupiter",
                        "description": "A probe arrived.",
                        "url": "https://news.example/jupiter",
                        "urlToImage": null,
                        "publishedAt": "2024-07-04T16:00:00Z",
                        "content": "The probe entered orbit on Thursday."
                    },
                    {
                        "source": {"id": null, "name": "Mirror"},
                        "title": "Probe reaches Jupiter (syndicated)",
                        "url": "https://news.example/jupiter",
                        "publishedAt": "2024-07-04T16:05:00Z"
                    },
                    {
                        "source": {"id": null, "name": "Wire"},
                        "title": "Untitled",
                        "url": null
                    }
                ]
            }"#,
        )
        .create_async()
        .await;

    let fetcher = NewsApiFetcher::new(server.url(), "news-key", 5).unwrap();
    let filter = FetchFilter {
        country: None,
        category: Some("science".to_string()),
        page_size: Some(3),
    };

    let articles = fetcher.fetch(&filter).await.unwrap();

    assert_eq!(articles.len(), 1);
    let article = &articles[0];
    assert_eq!(article.title, "Probe reaches Jupiter");
    assert_eq!(article.author, "");
    assert_eq!(article.source_name, "Science Daily");
    assert_eq!(article.category, "science");
    assert_eq!(article.content, "The probe entered orbit on Thursday.");

    mock.assert_async().await;
}

#[tokio::test]
async fn test_fetch_error_status_is_surfaced() {
    let mut server = mockito::Server::new_async().await;

    let _mock = server
        .mock("GET", "/top-headlines")
        .match_query(Matcher::Any)
        .with_status(401)
        .with_header("content-type", "application/json")
        .with_body(r#"{"status": "error", "code": "apiKeyInvalid", "message": "Your API key is invalid."}"#)
        .create_async()
        .await;

    let fetcher = NewsApiFetcher::new(server.url(), "bad-key", 5).unwrap();

    let err = fetcher.fetch(&FetchFilter::default()).await.unwrap_err();
    assert!(err.to_string().contains("401"));
}

#[tokio::test]
async fn test_fetch_api_level_error() {
    let mut server = mockito::Server::new_async().await;

    let _mock = server
        .mock("GET", "/top-headlines")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"status": "error", "code": "parametersMissing", "message": "Required parameters are missing."}"#)
        .create_async()
        .await;

    let fetcher = NewsApiFetcher::new(server.url(), "key", 5).unwrap();

    let err = fetcher.fetch(&FetchFilter::default()).await.unwrap_err();
    assert!(err.to_string().contains("Required parameters are missing"));
}

#[tokio::test]
async fn test_input_file_drops_missing_and_duplicate_urls() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(
        br#"[
            {"title": "First", "url": "https://a.example/1", "published_at": "2024-03-01T08:30:00Z"},
            {"title": "No url", "url": "", "published_at": "2024-03-01T08:30:00Z"},
            {"title": "Repeat", "url": "https://a.example/1", "published_at": "2024-03-01T09:00:00Z"},
            {"title": "Second", "url": "https://a.example/2", "published_at": "2024-03-01T10:00:00Z", "category": "science"}
        ]"#,
    )
    .expect("write input");

    let articles = read_articles_file(file.path()).await.expect("load input");

    let titles: Vec<_> = articles.iter().map(|a| a.title.as_str()).collect();
    assert_eq!(titles, vec!["First", "Second"]);
    assert_eq!(articles[0].category, "general");
    assert_eq!(articles[1].category, "science");
}

#[tokio::test]
async fn test_input_file_must_be_a_json_array() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(b"{\"title\": \"not a list\"}").expect("write input");

    assert!(read_articles_file(file.path()).await.is_err());
}
