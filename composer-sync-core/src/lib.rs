#![doc = "composer-sync-core: staging and upload pipeline for composer-sync."]

//! This crate contains the vendor-neutral logic of composer-sync: the data
//! model, filtered staging of a source directory, object-key derivation, the
//! [`contract::ObjectUploader`] interface and the upload pipeline that drives it.
//! The Cloud Storage client itself lives in the `composer-sync` crate.
//!
//! # Usage
//! Build a [`config::RunConfig`], then call [`synchronise::synchronise`] with a
//! connector closure returning an [`contract::ObjectUploader`] for a bucket.

pub mod config;
pub mod contract;
pub mod error;
pub mod key;
pub mod patterns;
pub mod stage;
pub mod synchronise;
pub mod upload;
