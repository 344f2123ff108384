//! Batch engine: conversion-service client, sequential batch runner and effect execution.
mod batch;
mod engine;
mod filename;
mod persist;
mod service;
mod types;

pub use batch::{
    reconcile, run_batch, validate, ChannelUpdateSink, RunTracker, UpdateSink,
    TEXT_EXTRACTION_FORMAT,
};
pub use engine::{EngineEvents, EngineHandle, EngineStopped};
pub use persist::{ArtifactStore, PersistError, SavedArtifact};
pub use service::{ConversionService, ReqwestConversionService, ServiceResponse, ServiceSettings};
pub use types::{
    ConversionError, ConversionOutput, EngineEvent, RunId, RunSummary, TransportKind, UploadItem,
    ValidationError,
};
