//! Call history repository.

use std::sync::Arc;

use chatlog_shared::constants::CALLS_COLLECTION;
use chatlog_shared::Call;
use chatlog_store::{DocumentStore, Fields, SortOrder};

use crate::codec::{from_document, to_fields};
use crate::error::Result;

#[derive(Clone)]
pub struct CallRepository {
    store: Arc<dyn DocumentStore>,
}

impl CallRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// All calls, most recently recorded first.
    pub async fn find_all(&self) -> Result<Vec<Call>> {
        self.store
            .list(CALLS_COLLECTION, SortOrder::RecentlyCreated)
            .await?
            .iter()
            .map(from_document::<Call>)
            .collect()
    }

    pub async fn insert_many(&self, calls: &[Call]) -> Result<usize> {
        let docs = calls
            .iter()
            .map(|call| -> Result<(String, Fields)> { Ok((call.id.clone(), to_fields(call)?)) })
            .collect::<Result<Vec<_>>>()?;
        Ok(self.store.insert_many(CALLS_COLLECTION, docs).await?)
    }

    pub async fn delete_all(&self) -> Result<u64> {
        Ok(self.store.delete_all(CALLS_COLLECTION).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatlog_shared::CallType;
    use chatlog_store::MemoryStore;

    fn call(id: &str, call_type: CallType) -> Call {
        Call {
            id: id.into(),
            name: format!("caller {id}"),
            avatar: "👤".into(),
            call_type,
            time: "Yesterday".into(),
            is_video: false,
            created_at: None,
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn newest_first() {
        let repo = CallRepository::new(Arc::new(MemoryStore::new()));
        assert!(repo.find_all().await.unwrap().is_empty());

        repo.insert_many(&[call("1", CallType::Incoming), call("2", CallType::Missed)])
            .await
            .unwrap();

        let calls = repo.find_all().await.unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].id, "2");
        assert_eq!(calls[0].call_type, CallType::Missed);
        assert!(calls[0].created_at.is_some());
    }
}
