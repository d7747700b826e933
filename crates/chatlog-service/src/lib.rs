//! # chatlog-service
//!
//! Repositories and services of the chat log backend, built on a shared
//! [`DocumentStore`]:
//!
//! - [`ChatRepository`]: chat documents and their append-only message log
//! - [`MessageService`]: validates and appends messages
//! - [`ChatQueryService`]: recency-ordered chat listing with a name filter
//! - [`CallRepository`]: call history
//! - [`ProfileService`]: the lazily created singleton profile
//! - [`Seeder`]: destructive reseed with the bundled demo fixtures

pub mod calls;
pub mod chats;
pub mod messages;
pub mod profile;
pub mod query;
pub mod seed;

mod codec;
mod error;

use std::sync::Arc;

use chatlog_store::DocumentStore;

pub use calls::CallRepository;
pub use chats::{AppendedMessage, ChatRepository};
pub use error::{Result, ServiceError};
pub use messages::MessageService;
pub use profile::ProfileService;
pub use query::ChatQueryService;
pub use seed::{Fixtures, SeedCounts, Seeder};

/// Every service wired to one store.
#[derive(Clone)]
pub struct Services {
    pub store: Arc<dyn DocumentStore>,
    pub chat_repo: ChatRepository,
    pub chats: ChatQueryService,
    pub messages: MessageService,
    pub calls: CallRepository,
    pub profile: ProfileService,
    pub seeder: Seeder,
}

impl Services {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        let chat_repo = ChatRepository::new(store.clone());
        let calls = CallRepository::new(store.clone());
        let profile = ProfileService::new(store.clone());

        Self {
            chats: ChatQueryService::new(chat_repo.clone()),
            messages: MessageService::new(chat_repo.clone()),
            seeder: Seeder::new(chat_repo.clone(), calls.clone(), profile.clone()),
            chat_repo,
            calls,
            profile,
            store,
        }
    }
}
