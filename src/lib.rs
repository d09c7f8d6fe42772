/********************************************************************************
 * Copyright (c) 2026 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

//! # pv-streamer
//!
//! `pv-streamer` forwards time-stamped scalar/array updates from external
//! data sources ("process variables", PVs) into a message broker, one topic
//! per PV, with per-schema serialisation. It implements the per-source
//! update pipeline: timestamp admission control, a serialised-message cache,
//! periodic cache republish, and the fan-out that publishes one incoming
//! update through one or more schema serialisers to independent
//! broker-bound streams.
//!
//! Typical usage is API-first and centered on [`UpdateHandler`] and
//! [`ProducerPool`]: one handler per monitored source, one pool per process
//! coordinating the shared broker producer.
//!
//! ## Quick start
//!
//! ```
//! use std::sync::Arc;
//! use pv_streamer::{
//!     ConnectionState, Producer, ProducerPool, PvUpdate, PvValue, SourceEvent, UpdateHandler,
//! };
//!
//! # use async_trait::async_trait;
//! # use pv_streamer::ProduceError;
//! #
//! # struct NoopProducer;
//! #
//! # #[async_trait]
//! # impl Producer for NoopProducer {
//! #     async fn produce(
//! #         &self,
//! #         _topic: &str,
//! #         _payload: &[u8],
//! #         _timestamp_ms: i64,
//! #         _key: &str,
//! #     ) -> Result<(), ProduceError> {
//! #         Ok(())
//! #     }
//! #
//! #     async fn close(&self) {}
//! # }
//! #
//! # fn now_ns() -> i64 {
//! #     use std::time::{SystemTime, UNIX_EPOCH};
//! #     SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos() as i64
//! # }
//! #
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let pool = Arc::new(ProducerPool::new());
//! let producer: Arc<dyn Producer> = Arc::new(NoopProducer);
//!
//! let mut handler = UpdateHandler::new(
//!     pool.clone(),
//!     producer.clone(),
//!     "some_pv",
//!     "output_topic",
//!     "f142",
//!     Some(500),
//! )
//! .await
//! .unwrap();
//!
//! handler
//!     .handle_event(&SourceEvent::Value(PvUpdate {
//!         value: PvValue::Double(3.14),
//!         timestamp_ns: now_ns(),
//!     }))
//!     .await;
//! handler
//!     .handle_event(&SourceEvent::Connection(ConnectionState::Disconnected))
//!     .await;
//!
//! handler.stop().await;
//! # });
//! ```
//!
//! ## Schema contract
//!
//! The schema set is fixed and resolved through a registry; an unknown name
//! fails construction before any tracker exists, naming the valid set.
//!
//! ```
//! use std::sync::Arc;
//! use pv_streamer::{Producer, ProducerPool, UpdateHandler};
//!
//! # use async_trait::async_trait;
//! # use pv_streamer::ProduceError;
//! #
//! # struct NoopProducer;
//! #
//! # #[async_trait]
//! # impl Producer for NoopProducer {
//! #     async fn produce(
//! #         &self,
//! #         _topic: &str,
//! #         _payload: &[u8],
//! #         _timestamp_ms: i64,
//! #         _key: &str,
//! #     ) -> Result<(), ProduceError> {
//! #         Ok(())
//! #     }
//! #
//! #     async fn close(&self) {}
//! # }
//! #
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let pool = Arc::new(ProducerPool::new());
//! let producer: Arc<dyn Producer> = Arc::new(NoopProducer);
//!
//! let err = UpdateHandler::new(pool, producer, "some_pv", "output_topic", "bogus", None)
//!     .await
//!     .unwrap_err();
//! assert!(err.to_string().contains("not a recognised supported schema"));
//! # });
//! ```
//!
//! ## Internal architecture map
//!
//! - Data plane: serialiser trackers (admission control + flush cache),
//!   tracker-set construction, refcounted producer pool
//! - Runtime: the cancellable periodic flush timer boundary
//! - Serialisation: schema registry and per-schema serialisers
//!
//! ## Observability model
//!
//! The crate uses `tracing` for logs/events. Library code emits
//! events/spans and does not unconditionally initialize a global subscriber.
//! Binaries and tests are responsible for one-time `tracing_subscriber`
//! initialization at process boundaries.

mod data_plane;
pub use data_plane::producer_pool::ProducerPool;
pub use data_plane::serialiser_tracker::SerialiserTracker;
pub use data_plane::tracker_set::create_tracker_set;

mod producer;
pub use producer::{ProduceError, Producer};

#[doc(hidden)]
pub mod observability;

mod runtime;

pub mod serialisation;
pub use serialisation::{SerialiseError, SerialisedUpdate, Serialiser, UnsupportedSchema};

mod update;
pub use update::{ConnectionState, PvUpdate, PvValue, SourceEvent};

mod update_handler;
pub use update_handler::UpdateHandler;
