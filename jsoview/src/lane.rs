/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Deferred chunk building.
//!
//! Expanding a large collection must not stall the frame that
//! expanded it. A [`ChunkLane`] queues chunk builds and lets the owner
//! run them later, a few at a time. Until a build completes the
//! presentation shows a loading placeholder for that node.
//!
//! Every request for a node takes a fresh ticket. A completed build
//! is applied only if its ticket is still the latest for that node,
//! so a slow build never overwrites the result of a newer request
//! made after the inputs changed.

use std::collections::HashMap;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::chunk::ChunkOptions;
use crate::chunk::Chunks;
use crate::chunk::build_chunks;
use crate::descriptor::NodeDescriptor;
use crate::error::ViewerError;
use crate::value::Identity;
use crate::value::Value;

/// One queued build.
#[derive(Debug, Clone)]
pub struct PendingBuild {
    pub node: NodeDescriptor,
    pub value: Value,
    pub options: ChunkOptions,
    generation: u64,
    ticket: u64,
}

impl PendingBuild {
    pub fn node_key(&self) -> &str {
        &self.node.node_key
    }

    /// Run the build. Pure; may be called off the lane.
    pub fn run(&self) -> Result<Chunks, ViewerError> {
        build_chunks(
            self.node.children(&self.value),
            self.node.sizing.chunk_size,
            &self.node,
            self.options,
        )
    }
}

#[derive(Debug)]
struct Built {
    source: Option<Identity>,
    size: usize,
    options: ChunkOptions,
    generation: u64,
    chunks: Rc<Chunks>,
}

impl Built {
    fn matches(&self, value: &Value, size: usize, options: ChunkOptions, generation: u64) -> bool {
        self.source == value.identity()
            && self.size == size
            && self.options == options
            && self.generation == generation
    }
}

/// Queue and cache of chunk builds, keyed by node key.
#[derive(Debug, Default)]
pub struct ChunkLane {
    next_ticket: u64,
    latest: HashMap<String, u64>,
    queue: VecDeque<PendingBuild>,
    built: HashMap<String, Built>,
}

impl ChunkLane {
    pub fn new() -> Self {
        Self::default()
    }

    /// Chunks for `node`, if a build for the same inputs already
    /// completed. Otherwise queue one (unless an identical request is
    /// pending) and return `None`.
    ///
    /// `generation` should come from
    /// [`crate::controller::ViewController::generation`], so
    /// reconfiguring the controller invalidates earlier builds.
    pub fn request(
        &mut self,
        node: &NodeDescriptor,
        value: &Value,
        options: ChunkOptions,
        generation: u64,
    ) -> Option<Rc<Chunks>> {
        let key = &node.node_key;
        let size = node.sizing.size;
        if let Some(built) = self.built.get(key)
            && built.matches(value, size, options, generation)
        {
            self.latest.remove(key);
            return Some(built.chunks.clone());
        }

        let duplicate = self.latest.get(key).and_then(|ticket| {
            self.queue.iter().find(|job| {
                job.ticket == *ticket
                    && job.value.same_value(value)
                    && job.node.sizing.size == size
                    && job.options == options
                    && job.generation == generation
            })
        });
        if duplicate.is_some() {
            return None;
        }

        self.next_ticket += 1;
        let ticket = self.next_ticket;
        self.latest.insert(key.clone(), ticket);
        self.queue.push_back(PendingBuild {
            node: node.clone(),
            value: value.clone(),
            options,
            generation,
            ticket,
        });
        tracing::trace!(node = %key, ticket, "queued chunk build");
        None
    }

    /// Pop the oldest queued build, skipping ones already superseded.
    pub fn take_next(&mut self) -> Option<PendingBuild> {
        while let Some(job) = self.queue.pop_front() {
            if self.latest.get(job.node_key()) == Some(&job.ticket) {
                return Some(job);
            }
            tracing::trace!(node = %job.node_key(), ticket = job.ticket, "dropped superseded chunk build");
        }
        None
    }

    /// Record the result of `job`. Returns `false`, leaving the cache
    /// untouched, if a newer request for the node was made meanwhile.
    pub fn complete(&mut self, job: &PendingBuild, chunks: Chunks) -> bool {
        let key = job.node_key();
        if self.latest.get(key) != Some(&job.ticket) {
            tracing::debug!(node = %key, ticket = job.ticket, "discarded stale chunk build");
            return false;
        }
        self.latest.remove(key);
        self.built.insert(
            key.to_string(),
            Built {
                source: job.value.identity(),
                size: job.node.sizing.size,
                options: job.options,
                generation: job.generation,
                chunks: Rc::new(chunks),
            },
        );
        true
    }

    /// Run up to `budget` queued builds. Returns the keys whose chunks
    /// became available.
    ///
    /// A failed build is no longer pending when its error is returned;
    /// the next request for the node queues it again.
    pub fn run_pending(&mut self, budget: usize) -> Result<Vec<String>, ViewerError> {
        let mut ready = Vec::new();
        for _ in 0..budget {
            let Some(job) = self.take_next() else {
                break;
            };
            let chunks = match job.run() {
                Ok(chunks) => chunks,
                Err(err) => {
                    self.fail(&job);
                    return Err(err);
                }
            };
            if self.complete(&job, chunks) {
                ready.push(job.node.node_key);
            }
        }
        if !ready.is_empty() {
            tracing::debug!(count = ready.len(), pending = self.queue.len(), "chunk builds ready");
        }
        Ok(ready)
    }

    fn fail(&mut self, job: &PendingBuild) {
        let key = job.node_key();
        if self.latest.get(key) == Some(&job.ticket) {
            self.latest.remove(key);
        }
        tracing::debug!(node = %key, ticket = job.ticket, "chunk build failed");
    }

    pub fn is_pending(&self, node_key: &str) -> bool {
        self.latest.contains_key(node_key)
    }

    pub fn has_pending(&self) -> bool {
        !self.latest.is_empty()
    }

    /// Drop everything known about `node_key`; an in-flight build for
    /// it will be discarded on completion.
    pub fn forget(&mut self, node_key: &str) {
        self.latest.remove(node_key);
        self.built.remove(node_key);
    }

    pub fn clear(&mut self) {
        self.latest.clear();
        self.queue.clear();
        self.built.clear();
    }
}
