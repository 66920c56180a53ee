#[cfg(test)]
mod tests {
    use mockito::Matcher;
    use range_client::{Expansion, QueryExpander, RangeConfig, RangeError};
    use std::time::Duration;

    fn expander(host: String, max_chars: usize) -> QueryExpander {
        let config = RangeConfig::new(host)
            .with_max_chars(max_chars)
            .with_user_agent("it-suite");
        QueryExpander::from_config(config).expect("client should build")
    }

    #[tokio::test]
    async fn test_expand_against_http_server() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", Matcher::Regex(r"^/range/list".to_string()))
            .match_query(Matcher::Any)
            .match_header("user-agent", Matcher::Regex(r"^it-suite/".to_string()))
            .with_status(200)
            .with_body("b\na\nc\n")
            .expect(1)
            .create_async()
            .await;

        let range = expander(server.host_with_port(), 7500);
        let result = range.expand("a,b,c").await.unwrap();

        assert_eq!(result, Expansion::Single(vec!["a".into(), "b".into(), "c".into()]));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_collapse_against_http_server() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", Matcher::Regex(r"^/range/expand".to_string()))
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("web{1-3}")
            .expect(1)
            .create_async()
            .await;

        let range = expander(server.host_with_port(), 7500);
        let collapsed = range.collapse(vec!["web1", "web2", "web3"]).await.unwrap();

        assert_eq!(collapsed, "web{1-3}");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_range_exception_header_from_server() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", Matcher::Regex(r"^/range/list".to_string()))
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("RangeException", "bad query")
            .create_async()
            .await;

        let range = expander(server.host_with_port(), 7500);
        match range.expand("%bogus").await {
            Err(RangeError::Server(message)) => assert_eq!(message, "bad query"),
            other => panic!("expected server error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_server_error_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", Matcher::Regex(r"^/range/list".to_string()))
            .match_query(Matcher::Any)
            .with_status(500)
            .create_async()
            .await;

        let range = expander(server.host_with_port(), 7500);
        let err = range.expand("a").await.unwrap_err();
        assert!(matches!(err, RangeError::Protocol { status: 500, .. }));
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn test_oversized_expression_issues_several_requests() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", Matcher::Regex(r"^/range/list".to_string()))
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("x\n")
            .expect(4)
            .create_async()
            .await;

        let range = expander(server.host_with_port(), 20);
        let expr: Vec<String> = (1..=10).map(|i| format!("web{:02}", i)).collect();
        let result = range.expand(expr).await.unwrap();

        match result {
            Expansion::Chunked(chunks) => assert_eq!(chunks.len(), 4),
            other => panic!("expected chunked expansion, got {:?}", other),
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transport_error() {
        let config = RangeConfig::new("127.0.0.1:1").with_connection_timeout(Duration::from_secs(2));
        let range = QueryExpander::from_config(config).unwrap();

        let err = range.expand("a").await.unwrap_err();
        assert!(matches!(err, RangeError::Transport { .. }));
    }
}
