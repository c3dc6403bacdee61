use alloy_primitives::Address;
use tracing::{debug, trace};

use crate::{
    address::{translate_each, AddressTranslator, Direction},
    gateway::{
        AddressEx, ExecutionInfo, GatewayError, Page, TransactionGateway, TransactionListItem,
    },
    store::KeyedStore,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PaginationError {
    /// No further page, either never fetched or the last page was reached.
    #[error("no more pages to load")]
    Exhausted,

    #[error("failed to load transaction history: {0}")]
    History(GatewayError),

    #[error("failed to load queued transactions: {0}")]
    Queue(GatewayError),
}

/// Continuation tokens of the last page fetched for a safe.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cursor {
    pub next: Option<String>,
    pub previous: Option<String>,
}

impl<T> From<&Page<T>> for Cursor {
    fn from(page: &Page<T>) -> Self {
        Self { next: page.next.clone(), previous: page.previous.clone() }
    }
}

/// Pagination cursors keyed by (chain id, safe).
#[derive(Debug, Default)]
pub struct CursorStore {
    cursors: KeyedStore<(u64, Address), Cursor>,
}

impl CursorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, chain_id: u64, safe: Address) -> Option<Cursor> {
        self.cursors.get(&(chain_id, safe))
    }

    pub fn set(&self, chain_id: u64, safe: Address, cursor: Cursor) {
        self.cursors.set((chain_id, safe), cursor);
    }

    pub fn invalidate(&self, chain_id: u64, safe: Address) -> Option<Cursor> {
        self.cursors.invalidate(&(chain_id, safe))
    }

    /// Stores `cursor` if `keep` rejects the current entry (or there is none).
    fn replace_unless<F>(&self, chain_id: u64, safe: Address, cursor: Cursor, keep: F) -> bool
    where
        F: FnOnce(&Cursor) -> bool,
    {
        self.cursors
            .update((chain_id, safe), |current| match current {
                Some(current) if keep(current) => None,
                _ => Some(cursor),
            })
            .is_some()
    }

    /// Replaces `expected` with `next`. Fails if another flow advanced the cursor first.
    pub fn advance(&self, chain_id: u64, safe: Address, expected: &Cursor, next: Cursor) -> bool {
        self.cursors
            .update((chain_id, safe), |current| (current == Some(expected)).then_some(next))
            .is_some()
    }
}

/// One fetched page, `next` tells whether another page can be loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedPage {
    pub values: Vec<TransactionListItem>,
    pub next: Option<String>,
}

#[derive(Debug, Clone, Copy)]
enum Listing {
    History,
    Queue,
}

/// Loads history and queued transaction lists and keeps their pagination state.
pub struct TransactionFeed<G, T> {
    gateway: G,
    translator: T,
    history: CursorStore,
    queue: CursorStore,
}

impl<G, T> TransactionFeed<G, T>
where
    G: TransactionGateway,
    T: AddressTranslator,
{
    pub fn new(gateway: G, translator: T) -> Self {
        Self { gateway, translator, history: CursorStore::new(), queue: CursorStore::new() }
    }

    pub fn history_cursors(&self) -> &CursorStore {
        &self.history
    }

    pub fn queue_cursors(&self) -> &CursorStore {
        &self.queue
    }

    /// First page of the history. A cursor established earlier is left in place.
    pub async fn load_history_transactions(
        &self,
        chain_id: u64,
        safe: Address,
    ) -> Result<Vec<TransactionListItem>, PaginationError> {
        let page = self
            .gateway
            .transaction_history(chain_id, safe, None)
            .await
            .map_err(PaginationError::History)?;

        self.history.replace_unless(chain_id, safe, Cursor::from(&page), |_| true);

        Ok(page.results)
    }

    pub async fn load_paged_history_transactions(
        &self,
        chain_id: u64,
        safe: Address,
    ) -> Result<FeedPage, PaginationError> {
        self.load_next(Listing::History, chain_id, safe).await
    }

    /// First page of the queue, missing signers translated back to external addresses.
    ///
    /// A stored cursor that reached the last page is replaced by the fresh one.
    pub async fn load_queued_transactions(
        &self,
        chain_id: u64,
        safe: Address,
    ) -> Result<Vec<TransactionListItem>, PaginationError> {
        let page = self
            .gateway
            .transaction_queue(chain_id, safe, None)
            .await
            .map_err(PaginationError::Queue)?;

        self.queue.replace_unless(chain_id, safe, Cursor::from(&page), |current| {
            current.next.is_some()
        });

        Ok(self.translate_missing_signers(page.results).await)
    }

    pub async fn load_paged_queued_transactions(
        &self,
        chain_id: u64,
        safe: Address,
    ) -> Result<FeedPage, PaginationError> {
        let mut page = self.load_next(Listing::Queue, chain_id, safe).await?;
        page.values = self.translate_missing_signers(page.values).await;
        Ok(page)
    }

    async fn load_next(
        &self,
        listing: Listing,
        chain_id: u64,
        safe: Address,
    ) -> Result<FeedPage, PaginationError> {
        let store = match listing {
            Listing::History => &self.history,
            Listing::Queue => &self.queue,
        };

        let Some(cursor) = store.get(chain_id, safe).filter(|c| c.next.is_some()) else {
            trace!(target: "safe::pagination", chain_id, %safe, ?listing, "No next page");
            return Err(PaginationError::Exhausted);
        };

        let page = match listing {
            Listing::History => self
                .gateway
                .transaction_history(chain_id, safe, cursor.next.clone())
                .await
                .map_err(PaginationError::History)?,
            Listing::Queue => self
                .gateway
                .transaction_queue(chain_id, safe, cursor.next.clone())
                .await
                .map_err(PaginationError::Queue)?,
        };

        let next = Cursor::from(&page);
        if !store.advance(chain_id, safe, &cursor, next.clone()) {
            debug!(target: "safe::pagination", chain_id, %safe, ?listing, "Cursor advanced concurrently, keeping the newer one");
        }

        Ok(FeedPage { values: page.results, next: next.next })
    }

    async fn translate_missing_signers(
        &self,
        mut items: Vec<TransactionListItem>,
    ) -> Vec<TransactionListItem> {
        for item in items.iter_mut() {
            let TransactionListItem::Transaction { transaction, .. } = item else {
                continue;
            };
            let Some(ExecutionInfo::Multisig { missing_signers: Some(signers), .. }) =
                transaction.execution_info.as_mut()
            else {
                continue;
            };

            let internal = signers.iter().map(|s| s.value).collect::<Vec<_>>();
            *signers = translate_each(&self.translator, internal, Direction::ToExternal)
                .await
                .into_iter()
                .map(AddressEx::from)
                .collect();
        }
        items
    }
}
