pub mod llm;
pub mod store;

pub use llm::OpenAiFlashcardAdapter;
pub use store::RestProposalStore;
