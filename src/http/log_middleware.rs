use std::time::Instant;

use http::Extensions;
use log::{debug, warn};
use reqwest::{Request, Response};
use reqwest_middleware::{Middleware, Next, Result};

/// Logs every portal request with its status and duration.
pub struct RequestLogMiddleware;

#[async_trait::async_trait]
impl Middleware for RequestLogMiddleware {
    async fn handle(
        &self,
        req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> Result<Response> {
        let method = req.method().clone();
        // Query strings can carry session tokens.
        let mut url = req.url().clone();
        url.set_query(None);
        let started = Instant::now();

        let result = next.run(req, extensions).await;
        let elapsed = started.elapsed().as_millis();
        match &result {
            Ok(response) => debug!("{} {} -> {} ({} ms)", method, url, response.status(), elapsed),
            Err(err) => warn!("{} {} failed after {} ms: {}", method, url, elapsed, err),
        }
        result
    }
}
