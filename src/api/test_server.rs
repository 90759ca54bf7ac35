//! Local HTTP server standing in for api.nasa.gov and the image host in tests

use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::thread;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use tiny_http::{Header, Response, Server, StatusCode};

/// Canned reply for one request path
#[derive(Clone)]
pub(crate) struct MockResponse {
    status: u16,
    content_type: &'static str,
    body: Vec<u8>,
}

impl MockResponse {
    pub(crate) fn json(status: u16, body: serde_json::Value) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: body.to_string().into_bytes(),
        }
    }

    pub(crate) fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: "text/plain",
            body: body.as_bytes().to_vec(),
        }
    }

    pub(crate) fn png(width: u32, height: u32) -> Self {
        Self {
            status: 200,
            content_type: "image/png",
            body: png_bytes(width, height),
        }
    }
}

pub(crate) struct MockServer {
    server: Option<Server>,
    base: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockServer {
    /// Bind on an ephemeral port; call `serve` once routes are known
    pub(crate) fn bind() -> Self {
        let server = Server::http("127.0.0.1:0").unwrap();
        let addr = server.server_addr().to_ip().unwrap();
        Self {
            server: Some(server),
            base: format!("http://{}", addr),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// Answer requests by path until the test process exits. Unknown paths get 404.
    pub(crate) fn serve(&mut self, routes: Vec<(&'static str, MockResponse)>) {
        let server = self.server.take().unwrap();
        let requests = Arc::clone(&self.requests);

        thread::spawn(move || {
            for request in server.incoming_requests() {
                let url = request.url().to_string();
                requests.lock().unwrap().push(url.clone());

                let path = url.split('?').next().unwrap_or_default();
                let reply = routes
                    .iter()
                    .find(|(p, _)| *p == path)
                    .map(|(_, r)| r.clone())
                    .unwrap_or_else(|| MockResponse::text(404, "not found"));

                let header = Header::from_bytes("Content-Type", reply.content_type).unwrap();
                let response = Response::from_data(reply.body)
                    .with_status_code(StatusCode(reply.status))
                    .with_header(header);
                let _ = request.respond(response);
            }
        });
    }

    /// Request URLs (path and query) seen so far
    pub(crate) fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = RgbImage::from_pixel(width, height, Rgb([12, 34, 56]));
    let mut out = Vec::new();
    DynamicImage::ImageRgb8(image)
        .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .unwrap();
    out
}
