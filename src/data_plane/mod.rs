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

//! Data-plane layer.
//!
//! Owns the per-source update pipeline: serialiser trackers with timestamp
//! admission control and flush caching, tracker-set construction, and the
//! refcounted shared-producer pool. This layer turns one incoming source
//! event into zero or more broker-bound messages.

pub(crate) mod producer_pool;
pub(crate) mod serialiser_tracker;
pub(crate) mod tracker_set;
