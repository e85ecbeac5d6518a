//! Debounced per-source request scheduling
//!
//! Every edit or cursor event triggers each attached source. Short prefixes
//! (length <= 1) issue immediately, since they change rapidly and a request
//! is cheap; longer prefixes start (or replace) a short debounce timer. At
//! most one request is in flight per (document, source): a trigger landing on
//! an in-flight request at the same anchor sets a pending flag instead of
//! issuing a duplicate, and resolves into exactly one follow-up request.
//!
//! A response is applied only if it is not stale relative to the live editor
//! state at arrival time; an in-flight request cannot be aborted at the
//! transport level, but ignoring its stale result is logically equivalent to
//! cancellation. The follow-up chase is an explicit loop rather than
//! recursion.

use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::candidate::Candidate;
use crate::context::AnchorContext;
use crate::session::{CompletionMux, DocumentSession, SourceHandle};
use crate::source::RequestContext;

impl CompletionMux {
    /// Trigger one source for the given context, debouncing and coalescing
    /// as required.
    pub(crate) fn trigger_source(
        &self,
        session: &Arc<DocumentSession>,
        handle: &Arc<SourceHandle>,
        ctx: AnchorContext,
    ) {
        let immediate = ctx.prefix.chars().count() <= 1;

        let mut state = handle.state.lock();
        if state.request_in_flight && state.anchored_at(&ctx) {
            if !state.request_pending {
                state.request_pending = true;
                state.stats.coalesced += 1;
                trace!(source = %handle.source.id(), "coalescing trigger into in-flight request");
            }
            return;
        }

        if immediate {
            state.cancel_debounce();
            drop(state);
            let mux = self.clone();
            let session = session.clone();
            let handle = handle.clone();
            tokio::spawn(async move {
                mux.issue_request(session, handle, ctx).await;
            });
            return;
        }

        state.stats.debounced += 1;
        let mux = self.clone();
        let session = session.clone();
        let task_handle = handle.clone();
        let delay = self.config.debounce_delay;
        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Detach the actual request from the timer handle: aborting a
            // superseded timer must never kill a request that has already
            // been issued.
            tokio::spawn(async move {
                mux.issue_request(session, task_handle, ctx).await;
            });
        });
        state.replace_debounce(timer);
    }

    /// Issue a request and apply its response, chasing pending triggers in a
    /// loop until none remain.
    pub(crate) async fn issue_request(
        self,
        session: Arc<DocumentSession>,
        handle: Arc<SourceHandle>,
        mut ctx: AnchorContext,
    ) {
        loop {
            if !self.sessions.contains_key(&session.id) {
                return;
            }

            {
                let mut state = handle.state.lock();
                if state.request_in_flight {
                    // A racing trigger got there first; fold into its
                    // follow-up instead of violating the one-in-flight
                    // invariant.
                    if state.anchored_at(&ctx) && !state.request_pending {
                        state.request_pending = true;
                        state.stats.coalesced += 1;
                    }
                    return;
                }
                state.request_in_flight = true;
                state.stats.issued += 1;
            }

            let request = RequestContext {
                document: session.id,
                context: ctx.clone(),
                line_text: self.editor.line_text(ctx.line).unwrap_or_default(),
            };
            let reply = handle.source.request(&request).await;

            let items = match reply {
                Ok(reply) => reply.items,
                Err(err) => {
                    warn!(
                        source = %handle.source.id(),
                        error = %err,
                        "suggestion request failed, treating as empty result"
                    );
                    handle.state.lock().stats.transport_failures += 1;
                    Vec::new()
                }
            };

            // Staleness is judged against the editor state *now*, not at
            // request time: a later-arriving but context-matching response
            // always wins over an earlier one for the same context.
            let live = self.live_context();
            let fresh = matches!(&live, Some(l) if l.same_anchor(&ctx));

            let follow_up;
            {
                let mut state = handle.state.lock();
                state.request_in_flight = false;

                if fresh {
                    let batch: Vec<Candidate> = items
                        .into_iter()
                        .filter_map(|raw| {
                            Candidate::from_raw(raw, handle.source.id(), &self.config)
                        })
                        .collect();
                    trace!(
                        source = %handle.source.id(),
                        count = batch.len(),
                        "ingesting completion response"
                    );
                    state.ingest(batch);
                } else {
                    state.stats.stale_discards += 1;
                    debug!(
                        source = %handle.source.id(),
                        captured_line = ctx.line,
                        captured_column = ctx.anchor_column,
                        "discarding stale completion response"
                    );
                }

                follow_up = if state.request_pending {
                    state.request_pending = false;
                    live.clone()
                } else {
                    None
                };
            }

            if fresh {
                if let Some(live) = &live {
                    self.render(&session, live).await;
                }
            }

            match follow_up {
                // Re-trigger immediately with the latest context so the
                // coalesced keystrokes get their answer.
                Some(next) => ctx = next,
                None => return,
            }
        }
    }
}
