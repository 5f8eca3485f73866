use std::io::Read;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::Url;

use crate::config::ApiConfig;
use crate::error::{NotesError, Operation};
use crate::remote::{Note, NoteDraft, NotesApi};

const COLLECTION_SEGMENT: &str = "notes";
const MAX_LOGGED_BODY: usize = 512;

#[derive(Debug, Clone)]
pub struct HttpNotesApi {
    client: Client,
    base_url: Url,
}

impl HttpNotesApi {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let base_url = Url::parse(config.base_url.trim())
            .with_context(|| format!("parsing API base url {}", config.base_url))?;
        if base_url.cannot_be_a_base() || !matches!(base_url.scheme(), "http" | "https") {
            bail!("API base url must be an http(s) url, got {}", base_url);
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .user_agent(config.user_agent.clone())
            .build()
            .context("building HTTP client")?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn collection_url(&self) -> Url {
        self.url_with_segments(&[COLLECTION_SEGMENT])
    }

    fn note_url(&self, id: &str) -> Url {
        self.url_with_segments(&[COLLECTION_SEGMENT, id])
    }

    fn url_with_segments(&self, extra: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        url.set_query(None);
        url.set_fragment(None);
        // Checked in `new`: base urls always accept path segments.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(extra);
        }
        url
    }

    fn send(&self, operation: Operation, request: RequestBuilder) -> Result<Response, NotesError> {
        let response = request
            .send()
            .map_err(|source| NotesError::Transport { operation, source })?;
        let status = response.status();
        if status.is_success() {
            tracing::debug!(%operation, %status, "remote call succeeded");
            return Ok(response);
        }

        let body = error_excerpt(response);
        tracing::warn!(
            %operation,
            %status,
            body = body.as_deref().unwrap_or(""),
            "remote returned an error status"
        );
        Err(NotesError::Status {
            operation,
            status,
            body,
        })
    }
}

/// Reads at most `MAX_LOGGED_BODY` bytes of an error response.
fn error_excerpt(response: Response) -> Option<String> {
    let mut buf = Vec::with_capacity(MAX_LOGGED_BODY);
    response
        .take(MAX_LOGGED_BODY as u64)
        .read_to_end(&mut buf)
        .ok()?;
    let text = String::from_utf8_lossy(&buf).trim().to_string();
    (!text.is_empty()).then_some(text)
}

impl NotesApi for HttpNotesApi {
    fn list_notes(&self) -> Result<Vec<Note>, NotesError> {
        let operation = Operation::List;
        let response = self.send(operation, self.client.get(self.collection_url()))?;
        response
            .json::<Vec<Note>>()
            .map_err(|source| NotesError::Decode { operation, source })
    }

    fn fetch_note(&self, id: &str) -> Result<Note, NotesError> {
        let operation = Operation::Fetch;
        let response = self.send(operation, self.client.get(self.note_url(id)))?;
        response
            .json::<Note>()
            .map_err(|source| NotesError::Decode { operation, source })
    }

    fn create_note(&self, draft: &NoteDraft) -> Result<(), NotesError> {
        let request = self.client.post(self.collection_url()).json(draft);
        self.send(Operation::Create, request).map(|_| ())
    }

    fn update_note(&self, id: &str, draft: &NoteDraft) -> Result<(), NotesError> {
        let request = self.client.put(self.note_url(id)).json(draft);
        self.send(Operation::Update, request).map(|_| ())
    }

    fn delete_note(&self, id: &str) -> Result<(), NotesError> {
        self.send(Operation::Delete, self.client.delete(self.note_url(id)))
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;
    use std::thread;

    use assert_matches::assert_matches;
    use reqwest::StatusCode;

    use super::*;
    use crate::app::NotesViewModel;
    use crate::render::TimestampFormat;

    #[derive(Debug)]
    struct Captured {
        method: String,
        path: String,
        body: String,
    }

    /// Serves one canned response per connection and reports what it received.
    fn serve<B>(responses: Vec<(u16, B)>) -> (String, mpsc::Receiver<Captured>)
    where
        B: Into<String> + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind test listener");
        let addr = listener.local_addr().expect("listener address");
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            for (status, body) in responses {
                let body: String = body.into();
                let Ok((mut stream, _)) = listener.accept() else {
                    return;
                };
                let captured = read_request(&mut stream);
                let _ = tx.send(captured);
                let reply = format!(
                    "HTTP/1.1 {status} Test\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(reply.as_bytes());
                let _ = stream.flush();
            }
        });
        (format!("http://{addr}"), rx)
    }

    fn read_request(stream: &mut std::net::TcpStream) -> Captured {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        let header_end = loop {
            let n = stream.read(&mut chunk).expect("read request");
            if n == 0 {
                break buf.len();
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };
        let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
        let content_length = head
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        while buf.len() < header_end + content_length {
            let n = stream.read(&mut chunk).expect("read body");
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }
        let mut request_line = head.lines().next().unwrap_or_default().split_whitespace();
        Captured {
            method: request_line.next().unwrap_or_default().to_string(),
            path: request_line.next().unwrap_or_default().to_string(),
            body: String::from_utf8_lossy(&buf[header_end..]).to_string(),
        }
    }

    fn api_for(base_url: &str) -> HttpNotesApi {
        let config = ApiConfig {
            base_url: base_url.to_string(),
            ..ApiConfig::default()
        };
        HttpNotesApi::new(&config).expect("client")
    }

    #[test]
    fn list_notes_preserves_server_order() -> anyhow::Result<()> {
        let (base, rx) = serve(vec![(
            200,
            r#"[{"id":"b","title":"Second"},{"id":"a","title":"First","created_at":"2024-01-01T00:00:00Z"}]"#,
        )]);
        let api = api_for(&base);

        let notes = api.list_notes()?;
        let ids: Vec<_> = notes.iter().map(|note| note.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);

        let request = rx.recv()?;
        assert_eq!(request.method, "GET");
        assert_eq!(request.path, "/notes");
        Ok(())
    }

    #[test]
    fn create_posts_trimmed_json_payload() -> anyhow::Result<()> {
        let (base, rx) = serve(vec![(201, r#"{"id":"new","title":"Todo"}"#)]);
        let api = api_for(&base);

        api.create_note(&NoteDraft::trimmed(" Todo ", ""))?;

        let request = rx.recv()?;
        assert_eq!(request.method, "POST");
        assert_eq!(request.path, "/notes");
        let body: serde_json::Value = serde_json::from_str(&request.body)?;
        assert_eq!(body, serde_json::json!({"title": "Todo", "detail": ""}));
        Ok(())
    }

    #[test]
    fn update_and_delete_address_the_note_id() -> anyhow::Result<()> {
        let (base, rx) = serve(vec![(200, "{}"), (200, r#"{"message":"Note deleted"}"#)]);
        let api = api_for(&base);

        api.update_note("a b", &NoteDraft::trimmed("T", "D"))?;
        api.delete_note("xyz")?;

        let update = rx.recv()?;
        assert_eq!(update.method, "PUT");
        assert_eq!(update.path, "/notes/a%20b");
        let delete = rx.recv()?;
        assert_eq!(delete.method, "DELETE");
        assert_eq!(delete.path, "/notes/xyz");
        Ok(())
    }

    #[test]
    fn base_url_prefix_is_kept() {
        let api = api_for("https://example.test/api/");
        assert_eq!(api.note_url("7").as_str(), "https://example.test/api/notes/7");
        assert_eq!(api.collection_url().as_str(), "https://example.test/api/notes");
    }

    #[test]
    fn non_success_status_becomes_status_error() {
        let (base, _rx) = serve(vec![(404, r#"{"error":"Note not found"}"#)]);
        let api = api_for(&base);

        let err = api.delete_note("missing").unwrap_err();
        assert_matches!(
            err,
            NotesError::Status { operation: Operation::Delete, status, body: Some(body) }
                if status == StatusCode::NOT_FOUND && body.contains("Note not found")
        );
    }

    #[test]
    fn malformed_list_body_is_decode_error() {
        let (base, _rx) = serve(vec![(200, r#"{"not":"a list"}"#)]);
        let api = api_for(&base);

        let err = api.list_notes().unwrap_err();
        assert_matches!(err, NotesError::Decode { operation: Operation::List, .. });
    }

    #[test]
    fn large_error_page_is_cut_for_logging() {
        let page = "x".repeat(MAX_LOGGED_BODY * 8);
        let (base, _rx) = serve(vec![(500, page)]);
        let api = api_for(&base);

        let err = api.list_notes().unwrap_err();
        assert_matches!(
            err,
            NotesError::Status { body: Some(body), .. } if body.len() == MAX_LOGGED_BODY
        );
    }

    /// Base url of a port that was bound once and is now closed.
    fn closed_port_url() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind test listener");
        let addr = listener.local_addr().expect("listener address");
        drop(listener);
        format!("http://{addr}")
    }

    #[test]
    fn unreachable_server_is_transport_error() {
        let api = api_for(&closed_port_url());

        assert_matches!(
            api.list_notes().unwrap_err(),
            NotesError::Transport { operation: Operation::List, .. }
        );
        assert_matches!(
            api.create_note(&NoteDraft::trimmed("T", "")).unwrap_err(),
            NotesError::Transport { operation: Operation::Create, .. }
        );
    }

    #[test]
    fn transport_failure_on_save_keeps_form_and_alerts() {
        let api = api_for(&closed_port_url());
        let mut vm = NotesViewModel::new(api, TimestampFormat::utc());
        vm.form_mut().title = "T".into();
        vm.form_mut().detail = "draft".into();

        let err = vm.save().unwrap_err();

        assert_matches!(err, NotesError::Transport { operation: Operation::Create, .. });
        assert_eq!(vm.form().title, "T");
        assert_eq!(vm.form().detail, "draft");
        assert_eq!(
            vm.alert().map(|alert| alert.message.as_str()),
            Some("Error saving the note")
        );
    }

    #[test]
    fn rejects_non_http_base_url() {
        let config = ApiConfig {
            base_url: "mailto:notes@example.test".into(),
            ..ApiConfig::default()
        };
        assert!(HttpNotesApi::new(&config).is_err());
    }
}
