//! Lazy, single-pass price cursor over a [`PriceStore`].

use futures_util::stream::{self, Stream};

use super::{PriceQuery, PriceStore};
use crate::error::Result;
use crate::models::price::{PriceKind, PriceRecord};

struct CursorState<'a, S: ?Sized> {
    store: &'a S,
    symbol: String,
    kind: PriceKind,
    query: PriceQuery,
    page_size: usize,
    buffered: std::vec::IntoIter<PriceRecord>,
    exhausted: bool,
}

/// Stream the records of `symbol` matching `query` in ascending order,
/// fetching `page_size` records at a time with keyset pagination on the
/// timestamp.
pub fn price_stream<'a, S>(
    store: &'a S,
    symbol: &str,
    kind: PriceKind,
    query: PriceQuery,
    page_size: usize,
) -> impl Stream<Item = Result<PriceRecord>> + 'a
where
    S: PriceStore + ?Sized,
{
    let state = CursorState {
        store,
        symbol: symbol.to_string(),
        kind,
        query,
        page_size: page_size.max(1),
        buffered: Vec::new().into_iter(),
        exhausted: false,
    };

    stream::try_unfold(state, |state| next_record(state))
}

async fn next_record<S>(mut state: CursorState<'_, S>) -> Result<Option<(PriceRecord, CursorState<'_, S>)>>
where
    S: PriceStore + ?Sized,
{
    loop {
        if let Some(record) = state.buffered.next() {
            return Ok(Some((record, state)));
        }
        if state.exhausted {
            return Ok(None);
        }

        let page = state
            .store
            .find_prices_page(&state.symbol, state.kind, &state.query, state.page_size)
            .await?;
        if page.len() < state.page_size {
            state.exhausted = true;
        }
        match page.last() {
            Some(last) => state.query.after = Some(last.timestamp()),
            None => return Ok(None),
        }
        state.buffered = page.into_iter();
    }
}
