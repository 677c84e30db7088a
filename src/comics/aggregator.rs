//! Fetch, filter and sort pipeline behind `GET /comics`.

use tracing::{info, instrument};

use crate::error::UpstreamError;
use crate::metrics;

use super::client::ComicClient;
use super::sort::sort_comics;
use super::types::{Comic, ComicRange};

/// Fetch every comic in `range`, keep odd-month ones and sort them by title.
///
/// Fetches run one at a time in ascending order. The first failure aborts
/// the whole range and nothing fetched so far is returned.
#[instrument(skip(client), fields(start = range.start, end = range.end))]
pub async fn collect_comics(
    client: &ComicClient,
    range: ComicRange,
) -> Result<Vec<Comic>, UpstreamError> {
    let mut comics = Vec::new();

    for num in range.ids() {
        let comic = client.fetch(num).await?;
        if comic.is_odd_month() {
            comics.push(comic);
        }
    }

    sort_comics(&mut comics);

    info!(
        requested = range.len(),
        returned = comics.len(),
        "Collected comics"
    );
    metrics::record_comics_returned(comics.len());

    Ok(comics)
}
