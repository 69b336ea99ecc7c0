//! Authorization primitives shared by the resource layer and the GraphQL API

pub mod voter;

pub use voter::ResourceNodeVoter;
