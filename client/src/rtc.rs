//! Peer call membership and signal routing
//!
//! The relay only forwards opaque signaling blobs; deciding which side of a
//! peer pair initiates is up to the clients. Both sides apply the same rule,
//! the lexicographically lower participant id initiates, so every pair
//! agrees on exactly one initiator no matter the order notices arrive in.
//!
//! Media itself is behind the `PeerFactory` and `MediaSource` seams. The
//! bundled `StubPeer` completes the offer/answer exchange over the relay and
//! reports a placeholder stream without carrying real media, which keeps the
//! whole signaling path exercised until a real engine is plugged in.

use log::{debug, info, warn};
use shared::{ClientMessage, ParticipantId, ServerMessage};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet, VecDeque};

/// Which side of a peer link this client plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerRole {
    Initiator,
    Receiver,
}

/// One signaling-level link to a remote participant.
pub trait PeerConnection {
    /// Starts offer generation. Only meaningful for the initiator side.
    fn initiate(&mut self);
    /// Feeds a signaling blob from the remote side.
    fn accept_signal(&mut self, payload: &str);
    /// Next outbound signaling blob, if one is ready.
    fn poll_signal(&mut self) -> Option<String>;
    /// Handle of the remote media stream once it has arrived.
    fn remote_stream(&self) -> Option<&str>;
    /// True once the link is broken beyond recovery.
    fn failed(&self) -> bool;
    fn close(&mut self);
}

/// Creates peer links in a given role.
pub trait PeerFactory {
    type Peer: PeerConnection;

    fn create(&mut self, role: PeerRole, local_stream: Option<&str>) -> Self::Peer;
}

/// Local capture device. Returning `None` from `open` means capture is
/// unavailable and the call proceeds without a local stream.
pub trait MediaSource {
    fn open(&mut self) -> Option<String>;
}

/// Tracks call membership and owns one peer link per remote caller.
pub struct CallManager<F: PeerFactory, M: MediaSource> {
    my_id: Option<ParticipantId>,
    factory: F,
    media: M,
    in_call: bool,
    local_stream: Option<String>,
    peers: HashMap<ParticipantId, F::Peer>,
    callers: HashSet<ParticipantId>,
    outbox: Vec<ClientMessage>,
}

impl<F: PeerFactory, M: MediaSource> CallManager<F, M> {
    pub fn new(factory: F, media: M) -> Self {
        Self {
            my_id: None,
            factory,
            media,
            in_call: false,
            local_stream: None,
            peers: HashMap::new(),
            callers: HashSet::new(),
            outbox: Vec::new(),
        }
    }

    pub fn in_call(&self) -> bool {
        self.in_call
    }

    pub fn is_peered(&self, id: &str) -> bool {
        self.peers.contains_key(id)
    }

    /// Remote media handle for `id`, once its peer link has one.
    pub fn remote_stream(&self, id: &str) -> Option<&str> {
        self.peers.get(id).and_then(|peer| peer.remote_stream())
    }

    /// Enters the call and reaches out to every known caller the initiator
    /// rule puts on our side. Does nothing before the relay has assigned us
    /// an id.
    pub fn join_call(&mut self) {
        if self.in_call || self.my_id.is_none() {
            return;
        }
        self.local_stream = self.media.open();
        if self.local_stream.is_none() {
            warn!("No local media available, joining call without a stream");
        }
        self.in_call = true;
        self.outbox.push(ClientMessage::CallJoin);

        let targets: Vec<ParticipantId> = self
            .callers
            .iter()
            .filter(|id| self.pairing_role(id) == Some(PeerRole::Initiator))
            .cloned()
            .collect();
        for id in targets {
            self.open_peer(&id, PeerRole::Initiator);
        }
    }

    /// Leaves the call and tears down every peer link.
    pub fn leave_call(&mut self) {
        if !self.in_call {
            return;
        }
        for (_, mut peer) in self.peers.drain() {
            peer.close();
        }
        self.local_stream = None;
        self.in_call = false;
        self.outbox.push(ClientMessage::CallLeave);
    }

    /// Folds one relay message into the call state. Lobby messages pass
    /// through untouched.
    pub fn handle_message(&mut self, message: &ServerMessage) {
        match message {
            ServerMessage::Connected { id } => {
                self.my_id = Some(id.clone());
            }
            ServerMessage::CallJoined { id } => {
                self.callers.insert(id.clone());
                if self.pairing_role(id) == Some(PeerRole::Initiator) {
                    self.open_peer(id, PeerRole::Initiator);
                }
            }
            ServerMessage::CallIncoming { id } => {
                self.callers.insert(id.clone());
                if self.pairing_role(id) == Some(PeerRole::Receiver) {
                    self.open_peer(id, PeerRole::Receiver);
                }
            }
            ServerMessage::CallLeft { id } => {
                self.callers.remove(id);
                if let Some(mut peer) = self.peers.remove(id) {
                    info!("Participant {} left the call", id);
                    peer.close();
                }
            }
            ServerMessage::RtcSignal { from, payload } => {
                self.handle_signal(from, payload);
            }
            ServerMessage::Roster { .. }
            | ServerMessage::StateUpdate { .. }
            | ServerMessage::RemoteAction { .. } => {}
        }
    }

    /// Collects outbound signals from every peer link and prunes links that
    /// have failed. Failures are isolated; the rest of the call carries on.
    pub fn poll(&mut self) {
        let mut broken: Vec<ParticipantId> = Vec::new();
        for (id, peer) in self.peers.iter_mut() {
            if peer.failed() {
                broken.push(id.clone());
                continue;
            }
            while let Some(payload) = peer.poll_signal() {
                self.outbox.push(ClientMessage::RtcSignal {
                    target: id.clone(),
                    payload,
                });
            }
        }
        for id in broken {
            warn!("Peer link to {} failed, discarding it", id);
            if let Some(mut peer) = self.peers.remove(&id) {
                peer.close();
            }
        }
    }

    /// Takes every queued outbound message.
    pub fn drain_outbox(&mut self) -> Vec<ClientMessage> {
        std::mem::take(&mut self.outbox)
    }

    fn handle_signal(&mut self, from: &ParticipantId, payload: &str) {
        if !self.peers.contains_key(from) {
            // An offer can beat the join notices here when the sender
            // learned about us first. Only the higher id answers it.
            if self.pairing_role(from) == Some(PeerRole::Receiver) {
                self.callers.insert(from.clone());
                self.open_peer(from, PeerRole::Receiver);
            } else {
                debug!("Dropping signal from {} with no peer link", from);
                return;
            }
        }
        if let Some(peer) = self.peers.get_mut(from) {
            peer.accept_signal(payload);
        }
    }

    fn pairing_role(&self, other: &ParticipantId) -> Option<PeerRole> {
        if !self.in_call {
            return None;
        }
        let my_id = self.my_id.as_ref()?;
        match my_id.cmp(other) {
            Ordering::Less => Some(PeerRole::Initiator),
            Ordering::Greater => Some(PeerRole::Receiver),
            Ordering::Equal => None,
        }
    }

    fn open_peer(&mut self, id: &ParticipantId, role: PeerRole) {
        if self.peers.contains_key(id) {
            debug!("Peer link to {} already exists", id);
            return;
        }
        info!("Opening {:?} peer link to {}", role, id);
        let mut peer = self.factory.create(role, self.local_stream.as_deref());
        if role == PeerRole::Initiator {
            peer.initiate();
        }
        self.peers.insert(id.clone(), peer);
    }
}

/// Media source for builds without a capture device.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMedia;

impl MediaSource for NoMedia {
    fn open(&mut self) -> Option<String> {
        None
    }
}

/// Peer link stand-in that answers the offer/answer exchange itself.
pub struct StubPeer {
    role: PeerRole,
    outbound: VecDeque<String>,
    remote_stream: Option<String>,
    closed: bool,
}

impl StubPeer {
    fn new(role: PeerRole) -> Self {
        Self {
            role,
            outbound: VecDeque::new(),
            remote_stream: None,
            closed: false,
        }
    }
}

impl PeerConnection for StubPeer {
    fn initiate(&mut self) {
        if self.role == PeerRole::Initiator && !self.closed {
            self.outbound.push_back(r#"{"type":"offer"}"#.to_string());
        }
    }

    fn accept_signal(&mut self, payload: &str) {
        if self.closed {
            return;
        }
        if payload.contains("\"offer\"") {
            self.outbound.push_back(r#"{"type":"answer"}"#.to_string());
            self.remote_stream = Some("placeholder".to_string());
        } else if payload.contains("\"answer\"") {
            self.remote_stream = Some("placeholder".to_string());
        }
    }

    fn poll_signal(&mut self) -> Option<String> {
        self.outbound.pop_front()
    }

    fn remote_stream(&self) -> Option<&str> {
        self.remote_stream.as_deref()
    }

    fn failed(&self) -> bool {
        false
    }

    fn close(&mut self) {
        self.closed = true;
        self.outbound.clear();
        self.remote_stream = None;
    }
}

/// Factory for [`StubPeer`] links.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubPeerFactory;

impl PeerFactory for StubPeerFactory {
    type Peer = StubPeer;

    fn create(&mut self, role: PeerRole, _local_stream: Option<&str>) -> StubPeer {
        StubPeer::new(role)
    }
}
