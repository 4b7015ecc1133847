#![doc = "year-progress-core: core logic library for year-progress."]

//! Everything that does not touch the network: the UTC year-progress
//! calculation, the text and image renderings of it, and the publish pipeline
//! written against the [`contract::SocialClient`] trait.
//!
//! # Usage
//! The CLI crate supplies a concrete client and calls [`publish::publish`].

pub mod banner;
pub mod contract;
pub mod progress;
pub mod publish;
pub mod text_bar;
