//! Cursor-driven feed traversal.

use iothub_protocol::{FeedDirection, FeedPage};

use crate::client::HubClient;
use crate::error::HubError;

/// Walks the confirmed-message feed one page at a time.
///
/// The hub cursor is stateless: the same token, direction and size always
/// return the same page. The pager only remembers the last token it was
/// given, so [`token`](Self::token) can be persisted and traversal resumed
/// later with [`HubClient::feed_pager`].
#[derive(Debug)]
pub struct FeedPager<'a> {
    client: &'a HubClient,
    direction: FeedDirection,
    size: u32,
    token: Option<String>,
    done: bool,
}

impl<'a> FeedPager<'a> {
    pub(crate) fn new(
        client: &'a HubClient,
        direction: FeedDirection,
        size: u32,
        start_token: Option<String>,
    ) -> Self {
        Self { client, direction, size, token: start_token, done: false }
    }

    /// Fetch the next page. Returns `None` once the page without a
    /// continuation token has been returned.
    ///
    /// A failed fetch leaves the pager where it was; calling again retries
    /// the same page.
    pub async fn next_page(&mut self) -> Result<Option<FeedPage>, HubError> {
        if self.done {
            return Ok(None);
        }

        let page = self
            .client
            .get_feed(self.token.as_deref(), self.direction, self.size)
            .await?;

        match &page.next_token {
            Some(next) => self.token = Some(next.clone()),
            None => self.done = true,
        }
        Ok(Some(page))
    }

    /// Token the next request will send, or the last one seen once done.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn direction(&self) -> FeedDirection {
        self.direction
    }
}
