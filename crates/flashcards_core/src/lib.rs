pub mod domain;
pub mod error;
pub mod generator;
pub mod identity;
pub mod parsing;
pub mod ports;
pub mod prompt;
pub mod validation;

pub use domain::{
    CallerIdentity, FlashcardCandidate, GenerationOutcome, GenerationRequest, NewProposal,
    ProposalStatus, RecordId, StoredProposal,
};
pub use error::{ErrorCode, GenerationError};
pub use generator::FlashcardGenerator;
pub use ports::{FlashcardModelService, PortError, PortResult, ProposalStore};
pub use prompt::GenerationPrompt;
