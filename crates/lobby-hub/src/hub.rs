//! The hub: a connection registry plus a single dispatcher task that fans
//! every event out to every member, in order.
//!
//! Producers (connection tasks, HTTP handlers) never write to sockets.
//! They push [`BroadcastEvent`]s onto one unbounded mpsc queue and return.
//! Only the dispatcher dequeues, so the order events enter the queue is
//! the order every recipient observes them.
//!
//! The member map sits behind one `tokio::sync::Mutex`. It is held only
//! to insert, remove, or snapshot entries, never across a network write.
//!
//! Every queued event carries a sequence number, and every member records
//! the number its own `Joined` got. An event only reaches members that
//! joined at or before it was enqueued, so a late joiner never sees
//! traffic that was already in flight when it arrived. Stamping and
//! pushing happen under one short `parking_lot` lock, so stamp order is
//! always queue order.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Weak};

use futures_util::future::join_all;
use lobby_protocol::{BroadcastEvent, Codec};
use lobby_transport::{Connection, ConnectionId, TransportError};
use tokio::sync::{Mutex, mpsc};

use crate::{HubConfig, HubError};

/// A registered connection and the user it belongs to.
struct Member<C> {
    username: String,
    conn: Arc<C>,
    joined_at: u64,
}

type Members<C> = Arc<Mutex<HashMap<ConnectionId, Member<C>>>>;

/// An event waiting in the queue, stamped with its enqueue order.
struct Queued {
    seq: u64,
    event: BroadcastEvent,
}

/// Producer side of the queue. The counter and the sender live under the
/// same lock; `push` never blocks, so the lock is held only briefly.
struct Queue {
    next_seq: u64,
    sender: mpsc::UnboundedSender<Queued>,
}

impl Queue {
    fn stamp(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    fn push(&mut self, event: BroadcastEvent) -> Result<u64, HubError> {
        let seq = self.stamp();
        self.sender
            .send(Queued { seq, event })
            .map_err(|_| HubError::Closed)?;
        Ok(seq)
    }
}

/// Handle to a running hub. Cheap to clone; every clone feeds the same
/// dispatcher.
///
/// The dispatcher stops once every handle has been dropped and the queue
/// has drained.
pub struct Hub<C: Connection> {
    members: Members<C>,
    queue: Arc<parking_lot::Mutex<Queue>>,
}

impl<C: Connection> Clone for Hub<C> {
    fn clone(&self) -> Self {
        Self {
            members: Arc::clone(&self.members),
            queue: Arc::clone(&self.queue),
        }
    }
}

impl<C: Connection> Hub<C> {
    /// Registers `conn` as owned by `username` and announces it.
    ///
    /// The same user may join from several connections; each is its own
    /// member. Its first delivered event is its own `Joined`.
    ///
    /// # Errors
    /// [`HubError::Closed`] if the dispatcher is gone; nothing is
    /// registered in that case.
    pub async fn join(
        &self,
        conn: Arc<C>,
        username: impl Into<String>,
    ) -> Result<ConnectionId, HubError> {
        let id = conn.id();
        let username = username.into();

        // Pushing `Joined` and inserting the member both happen under the
        // member lock, so the dispatcher cannot snapshot for this event (or
        // any later one) before the member is in the map.
        let mut members = self.members.lock().await;
        let seq = self.queue.lock().push(BroadcastEvent::Joined {
            username: username.clone(),
        })?;
        members.insert(
            id,
            Member {
                username: username.clone(),
                conn,
                joined_at: seq,
            },
        );
        tracing::info!(
            %id,
            %username,
            online = members.len(),
            "connection joined"
        );
        Ok(id)
    }

    /// Unregisters a connection and announces its departure.
    ///
    /// Returns the owner's username, or `None` if the connection was not
    /// registered (already left, or dropped by the dispatcher after a
    /// failed write). Only the call that actually removes the entry
    /// enqueues `Left`, so each connection is announced gone exactly once.
    pub async fn leave(&self, id: ConnectionId) -> Result<Option<String>, HubError> {
        let removed = {
            let mut members = self.members.lock().await;
            let removed = members.remove(&id);
            if let Some(member) = &removed {
                tracing::info!(
                    %id,
                    username = %member.username,
                    online = members.len(),
                    "connection left"
                );
            }
            removed
        };

        let Some(member) = removed else {
            return Ok(None);
        };
        self.enqueue(BroadcastEvent::Left {
            username: member.username.clone(),
        })?;
        Ok(Some(member.username))
    }

    /// Broadcasts a chat message from `username`.
    ///
    /// Does not touch the member map. Content is passed through as-is:
    /// there is no size limit, validation, or rate limiting here.
    pub fn send(
        &self,
        username: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<(), HubError> {
        self.enqueue(BroadcastEvent::Chat {
            username: username.into(),
            content: content.into(),
        })
    }

    /// Number of registered connections.
    pub async fn len(&self) -> usize {
        self.members.lock().await.len()
    }

    /// Returns `true` if no connections are registered.
    pub async fn is_empty(&self) -> bool {
        self.members.lock().await.is_empty()
    }

    /// Returns `true` if `id` is currently registered.
    pub async fn contains(&self, id: ConnectionId) -> bool {
        self.members.lock().await.contains_key(&id)
    }

    /// Usernames of all registered connections, sorted, one entry per
    /// connection (a user with two tabs open appears twice).
    pub async fn usernames(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .members
            .lock()
            .await
            .values()
            .map(|m| m.username.clone())
            .collect();
        names.sort();
        names
    }

    fn enqueue(&self, event: BroadcastEvent) -> Result<(), HubError> {
        self.queue.lock().push(event).map(|_| ())
    }
}

/// The dispatcher's state. Runs inside its own Tokio task.
struct Dispatcher<C, K> {
    members: Members<C>,
    // Weak so the dispatcher does not keep the sender alive.
    queue: Weak<parking_lot::Mutex<Queue>>,
    codec: K,
    config: HubConfig,
}

impl<C: Connection, K: Codec> Dispatcher<C, K> {
    /// Drains the queue one event at a time until every sender is gone.
    async fn run(self, mut receiver: mpsc::UnboundedReceiver<Queued>) {
        tracing::info!("hub dispatcher started");

        // Departures caused by failed writes are announced before the next
        // queued event, so they stay in the same global order for everyone.
        let mut pending = VecDeque::new();
        while let Some(queued) = receiver.recv().await {
            pending.push_back(queued);
            while let Some(Queued { seq, event }) = pending.pop_front() {
                for username in self.deliver(seq, &event).await {
                    pending.push_back(Queued {
                        seq: self.stamp(),
                        event: BroadcastEvent::Left { username },
                    });
                }
            }
        }

        tracing::info!("hub dispatcher stopped");
    }

    /// Stamps an event the dispatcher generates itself. Once every handle
    /// is gone nobody can join any more, so the event goes to everyone left.
    fn stamp(&self) -> u64 {
        self.queue
            .upgrade()
            .map_or(u64::MAX, |queue| queue.lock().stamp())
    }

    /// Delivers one event to every member registered right now that
    /// joined no later than `seq`.
    ///
    /// Returns the usernames of members dropped because their write failed.
    async fn deliver(&self, seq: u64, event: &BroadcastEvent) -> Vec<String> {
        let bytes = match self.codec.encode(event) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(
                    kind = event.kind(),
                    username = %event.username(),
                    error = %e,
                    "dropping event that failed to encode"
                );
                return Vec::new();
            }
        };

        // Snapshot under the lock, write without it. Removals made while
        // we write cannot make us skip or revisit anyone.
        let recipients: Vec<(ConnectionId, Arc<C>)> = {
            let members = self.members.lock().await;
            members
                .iter()
                .filter(|(_, member)| member.joined_at <= seq)
                .map(|(id, member)| (*id, Arc::clone(&member.conn)))
                .collect()
        };

        let timeout = self.config.write_timeout;
        let writes = recipients.iter().map(|(id, conn)| {
            let bytes = bytes.as_slice();
            async move {
                let result = match tokio::time::timeout(timeout, conn.send(bytes)).await {
                    Ok(result) => result,
                    Err(_) => Err(TransportError::SendTimedOut(timeout)),
                };
                (*id, result)
            }
        });

        let mut dropped = Vec::new();
        for (id, result) in join_all(writes).await {
            if let Err(e) = result {
                tracing::debug!(%id, kind = event.kind(), error = %e, "write failed");
                if let Some(username) = self.drop_connection(id).await {
                    dropped.push(username);
                }
            }
        }

        tracing::debug!(
            kind = event.kind(),
            recipients = recipients.len(),
            dropped = dropped.len(),
            "event delivered"
        );
        dropped
    }

    /// Removes a member whose write failed and closes its handle.
    ///
    /// Returns `None` if the connection's own task already removed it.
    async fn drop_connection(&self, id: ConnectionId) -> Option<String> {
        let member = self.members.lock().await.remove(&id)?;

        match tokio::time::timeout(self.config.write_timeout, member.conn.close()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::debug!(%id, error = %e, "close after failed write"),
            Err(_) => tracing::debug!(%id, "close after failed write timed out"),
        }

        tracing::info!(
            %id,
            username = %member.username,
            "dropped connection after failed write"
        );
        Some(member.username)
    }
}

/// Spawns the dispatcher task and returns a handle to the new hub.
///
/// The codec encodes each event once; the same bytes go to every member.
pub fn spawn_hub<C, K>(config: HubConfig, codec: K) -> Hub<C>
where
    C: Connection,
    K: Codec,
{
    let (tx, rx) = mpsc::unbounded_channel();
    let members: Members<C> = Arc::new(Mutex::new(HashMap::new()));
    let queue = Arc::new(parking_lot::Mutex::new(Queue {
        next_seq: 0,
        sender: tx,
    }));

    let dispatcher = Dispatcher {
        members: Arc::clone(&members),
        queue: Arc::downgrade(&queue),
        codec,
        config,
    };
    tokio::spawn(dispatcher.run(rx));

    Hub { members, queue }
}
