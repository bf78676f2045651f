//! SSE stream parsing for OpenAI-compatible streaming responses.
//!
//! Transport chunks do not respect line boundaries, so a partial trailing
//! line is buffered and completed by the next chunk before parsing.

use futures::{stream, Stream, StreamExt};

use aidas_core::{Error, Result, TokenStream};

use super::types::ChatCompletionChunk;

/// Parse SSE stream from an OpenAI-compatible endpoint into text fragments.
pub fn parse_sse_stream(
    stream: impl Stream<Item = std::result::Result<bytes::Bytes, reqwest::Error>> + Send + 'static,
) -> TokenStream {
    let token_stream = stream
        .map(|chunk_result| {
            chunk_result.map_err(|e| Error::Inference(format!("Stream error: {}", e)))
        })
        .scan(String::new(), |buffer, result| {
            let items = match result {
                Ok(bytes) => {
                    buffer.push_str(&String::from_utf8_lossy(&bytes));
                    drain_complete_lines(buffer)
                }
                Err(e) => vec![Err(e)],
            };
            futures::future::ready(Some(stream::iter(items)))
        })
        .flatten();

    Box::pin(token_stream)
}

/// Parse every newline-terminated line in the buffer, leaving a trailing
/// partial line for the next chunk.
fn drain_complete_lines(buffer: &mut String) -> Vec<Result<String>> {
    let mut out = Vec::new();
    while let Some(pos) = buffer.find('\n') {
        let line: String = buffer.drain(..=pos).collect();
        if let Some(item) = parse_sse_line(line.trim()) {
            out.push(item);
        }
    }
    out
}

/// Parse a single complete SSE line and extract content.
fn parse_sse_line(line: &str) -> Option<Result<String>> {
    // Skip empty lines and comments
    if line.is_empty() || line.starts_with(':') {
        return None;
    }

    // End of stream marker
    if line == "data: [DONE]" {
        return None;
    }

    let data = line.strip_prefix("data: ")?;
    match serde_json::from_str::<ChatCompletionChunk>(data) {
        Ok(chunk) => {
            let content: String = chunk
                .choices
                .into_iter()
                .filter_map(|c| c.delta.content)
                .collect();
            if content.is_empty() {
                None
            } else {
                Some(Ok(content))
            }
        }
        Err(e) => Some(Err(Error::Inference(format!(
            "Failed to parse SSE chunk: {}",
            e
        )))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    async fn collect_fragments(chunks: &[&str]) -> Vec<Result<String>> {
        let source = stream::iter(
            chunks
                .iter()
                .map(|c| Ok(Bytes::copy_from_slice(c.as_bytes())))
                .collect::<Vec<std::result::Result<Bytes, reqwest::Error>>>(),
        );
        parse_sse_stream(source).collect().await
    }

    #[test]
    fn test_parse_line_with_content() {
        let line = r#"data: {"choices":[{"index":0,"delta":{"content":"Labas"},"finish_reason":null}]}"#;
        assert_eq!(parse_sse_line(line).unwrap().unwrap(), "Labas");
    }

    #[test]
    fn test_parse_line_done() {
        assert!(parse_sse_line("data: [DONE]").is_none());
    }

    #[test]
    fn test_parse_line_empty_delta() {
        let line = r#"data: {"choices":[{"index":0,"delta":{},"finish_reason":null}]}"#;
        assert!(parse_sse_line(line).is_none());
    }

    #[test]
    fn test_parse_line_role_only() {
        let line =
            r#"data: {"choices":[{"index":0,"delta":{"role":"assistant"},"finish_reason":null}]}"#;
        assert!(parse_sse_line(line).is_none());
    }

    #[test]
    fn test_parse_line_comment_and_empty() {
        assert!(parse_sse_line(": keepalive").is_none());
        assert!(parse_sse_line("").is_none());
    }

    #[test]
    fn test_parse_line_invalid_json() {
        let result = parse_sse_line("data: {invalid json}");
        assert!(result.unwrap().is_err());
    }

    #[test]
    fn test_parse_line_finish_reason() {
        let line =
            r#"data: {"choices":[{"index":0,"delta":{"content":"!"},"finish_reason":"stop"}]}"#;
        assert_eq!(parse_sse_line(line).unwrap().unwrap(), "!");
    }

    #[test]
    fn test_drain_keeps_partial_trailing_line() {
        let mut buffer = String::from(
            "data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"Labas\"},\"finish_reason\":null}]}\n\ndata: {\"choi",
        );
        let items = drain_complete_lines(&mut buffer);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].as_ref().unwrap(), "Labas");
        assert_eq!(buffer, "data: {\"choi");
    }

    #[tokio::test]
    async fn test_line_split_across_chunks() {
        let fragments = collect_fragments(&[
            "data: {\"choices\":[{\"index\":0,\"delta\":{\"cont",
            "ent\":\" rytas\"},\"finish_reason\":null}]}\n\n",
            "data: [DONE]\n\n",
        ])
        .await;

        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].as_ref().unwrap(), " rytas");
    }

    #[tokio::test]
    async fn test_multiple_lines_in_one_chunk() {
        let fragments = collect_fragments(&[
            "data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"Labas\"},\"finish_reason\":null}]}\n\ndata: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\" rytas\"},\"finish_reason\":null}]}\n\n",
        ])
        .await;

        let collected: String = fragments
            .into_iter()
            .map(|f| f.unwrap())
            .collect();
        assert_eq!(collected, "Labas rytas");
    }
}
