#![warn(clippy::pedantic)]
// Sometimes a redundant else is clearer
#![allow(clippy::redundant_else)]
// Don't care enough to fix
#![allow(clippy::match_same_arms)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::similar_names)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::wildcard_imports)]

pub mod cache;
pub mod cancel;
pub mod hints;
pub mod metrics;
pub mod recursive;
pub mod singleflight;
pub mod transport;
pub mod util;

use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::Instrument;

use dns_wire::protocol::types::Question;
use dns_wire::zones::ZoneIndex;

use self::cache::SharedCache;
use self::cancel::CancelSignal;
use self::hints::RootHints;
use self::metrics::Metrics;
use self::recursive::resolve_recursive;
use self::singleflight::SingleFlight;
use self::transport::{NetTransport, Transport};
use self::util::types::{QueryFingerprint, ResolutionError, ResolvedAnswer};

/// A recursive resolver: a transport, a root hint set, local zone
/// data, and a cache, with queries de-duplicated so that concurrent
/// askers of the same question share one network transaction.
pub struct Resolver<T> {
    transport: T,
    hints: RootHints,
    zones: Arc<RwLock<ZoneIndex>>,
    cache: SharedCache,
    inflight: SingleFlight<QueryFingerprint, (Metrics, Result<ResolvedAnswer, ResolutionError>)>,
}

impl Resolver<NetTransport> {
    /// A resolver over real UDP and TCP sockets, starting from the
    /// IANA root servers.
    pub fn new() -> Self {
        Self::with_transport(NetTransport::default(), RootHints::default())
    }
}

impl Default for Resolver<NetTransport> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Transport + Sync> Resolver<T> {
    pub fn with_transport(transport: T, hints: RootHints) -> Self {
        Self {
            transport,
            hints,
            zones: Arc::new(RwLock::new(ZoneIndex::new())),
            cache: SharedCache::new(),
            inflight: SingleFlight::new(),
        }
    }

    /// The local zone data, consulted before anything goes out to the
    /// network.  Many readers or one writer at a time.
    pub fn zones(&self) -> &Arc<RwLock<ZoneIndex>> {
        &self.zones
    }

    pub fn cache(&self) -> &SharedCache {
        &self.cache
    }

    /// Resolve a question, starting from local data and the cache and
    /// descending from the root hints if needed.
    ///
    /// Concurrent calls for the same `(name, type, class)` while one
    /// is in flight share that query's outcome (and its metrics).
    ///
    /// # Errors
    ///
    /// See `ResolutionError`.  NXDOMAIN and NODATA are not errors:
    /// they come back as a `ResolvedAnswer` with an empty answer
    /// section.
    pub async fn resolve(
        &self,
        question: &Question,
        cancel: &CancelSignal,
    ) -> (Metrics, Result<ResolvedAnswer, ResolutionError>) {
        let fingerprint = QueryFingerprint::from_question(question);

        self.inflight
            .run(fingerprint, async {
                let mut metrics = Metrics::new();
                let zones = self.zones.read().await;
                let result = resolve_recursive(
                    &self.transport,
                    &zones,
                    &self.cache,
                    &self.hints,
                    &mut metrics,
                    question,
                    cancel,
                )
                .instrument(tracing::error_span!("resolve", %question))
                .await;
                (metrics, result)
            })
            .await
    }
}
