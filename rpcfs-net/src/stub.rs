use crate::{CallError, FramedTransport, Request, Response, Service, Skeleton, TransportError};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::net::SocketAddr;
use serde::{de::DeserializeOwned, Serialize};
use tokio::net::TcpStream;

/// A client-side proxy for one remote interface: just the target address and
/// the interface's name. Every generated stub method funnels through
/// [`RemoteRef::call`], which dials a fresh connection, ships the request,
/// and awaits the reply -- "reconnect per call rather than holding a live
/// socket" (Design Notes). Equality, hashing, and `Display` all follow
/// directly from `(interface, address)`, matching distant-net's stub
/// equality contract.
#[derive(Clone)]
pub struct RemoteRef<T> {
    interface: &'static str,
    address: SocketAddr,
    _request: std::marker::PhantomData<fn() -> T>,
}

impl<T> RemoteRef<T> {
    /// Builds a ref targeting a running skeleton's bound address.
    ///
    /// Fails with a [`TransportError`] if the skeleton is not `Running`, or if
    /// a connectivity probe against its address does not succeed (spec.md
    /// §4.4 construction 1: "the skeleton must be in state Running and
    /// reachable").
    pub async fn from_skeleton<S>(skeleton: &Skeleton<S>) -> Result<Self, TransportError>
    where
        S: Service<Request = T>,
    {
        if skeleton.state() != crate::SkeletonState::Running {
            return Err(TransportError::Protocol(
                "cannot build a stub from a skeleton that is not running".into(),
            ));
        }
        let address = skeleton.address();
        TcpStream::connect(address)
            .await
            .map_err(|_| TransportError::Connect(address))?;
        Ok(Self::new(S::INTERFACE, address))
    }

    /// Builds a ref from a skeleton's port with an externally-routable
    /// hostname overriding the skeleton's own bind address -- used when a
    /// storage server's skeleton is bound to `0.0.0.0` but must advertise
    /// its externally-reachable hostname to the naming server.
    pub fn from_skeleton_with_hostname<S>(
        skeleton: &Skeleton<S>,
        hostname: std::net::IpAddr,
    ) -> Result<Self, TransportError>
    where
        S: Service<Request = T>,
    {
        if skeleton.state() != crate::SkeletonState::Running {
            return Err(TransportError::Protocol(
                "cannot build a stub from a skeleton that is not running".into(),
            ));
        }
        let port = skeleton.address().port();
        Ok(Self::new(S::INTERFACE, SocketAddr::new(hostname, port)))
    }

    /// Builds a ref from a raw, externally-known address -- used to
    /// bootstrap a client that already knows where the server lives.
    pub fn from_address(interface: &'static str, address: SocketAddr) -> Self {
        Self::new(interface, address)
    }

    fn new(interface: &'static str, address: SocketAddr) -> Self {
        Self {
            interface,
            address,
            _request: std::marker::PhantomData,
        }
    }

    pub fn address(&self) -> SocketAddr {
        self.address
    }

    pub fn interface(&self) -> &'static str {
        self.interface
    }

    /// Ships `payload` to the target address and awaits a typed reply.
    pub async fn call<Req, Resp>(&self, payload: Req) -> Result<Resp, CallError>
    where
        Req: Serialize + Send,
        Resp: DeserializeOwned + Send,
    {
        let stream = TcpStream::connect(self.address)
            .await
            .map_err(|_| CallError::Transport(TransportError::Connect(self.address)))?;

        let mut transport = FramedTransport::new(stream);
        let request = Request::new(payload);
        let request_id = request.id.clone();

        transport
            .write_value(&request)
            .await
            .map_err(CallError::Transport)?;

        let response: Response<Resp> = transport.read_value().await.map_err(CallError::Transport)?;

        if response.origin_id != request_id {
            return Err(CallError::Transport(TransportError::Protocol(
                "reply did not match the outstanding request".into(),
            )));
        }

        response.payload.map_err(CallError::Remote)
    }
}

impl<T> PartialEq for RemoteRef<T> {
    fn eq(&self, other: &Self) -> bool {
        self.interface == other.interface && self.address == other.address
    }
}

impl<T> Eq for RemoteRef<T> {}

impl<T> Hash for RemoteRef<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.interface.hash(state);
        self.address.hash(state);
    }
}

impl<T> fmt::Debug for RemoteRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RemoteRef({} @ {})", self.interface, self.address)
    }
}

impl<T> fmt::Display for RemoteRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.interface, self.address)
    }
}

impl<T> serde::Serialize for RemoteRef<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        (self.interface, self.address).serialize(serializer)
    }
}

impl<'de, T: WireInterface> serde::Deserialize<'de> for RemoteRef<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        // The interface name still travels on the wire (stubs sent as
        // arguments must round-trip even if the receiving binary links a
        // different crate version), but the `'static` copy compiled into
        // this process is what callers actually compare and hash against.
        let (_interface, address): (String, SocketAddr) =
            serde::Deserialize::deserialize(deserializer)?;
        Ok(Self::new(T::WIRE_INTERFACE_NAME, address))
    }
}

/// Associates a `'static` interface name with a request type, so a
/// deserialized [`RemoteRef`] can recover the right name without shipping it
/// as an owned `String` that outlives the call.
pub trait WireInterface {
    const WIRE_INTERFACE_NAME: &'static str;
}
