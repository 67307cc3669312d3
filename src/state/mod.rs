pub mod registry;

pub use registry::{
    CandidateRecord, ElectionRecord, ElectionStore, InMemElectionStore, RegistrySeed,
    StoreError, VoteRecord, VoterRecord,
};
