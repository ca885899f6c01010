use crate::{FramedTransport, RemoteFailure, Request, Response, Service};
use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Lifecycle of a [`Skeleton`]. Terminal once `Stopped`; there is no restart.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SkeletonState {
    Unstarted,
    Running,
    Stopped,
}

struct Running {
    shutdown: oneshot::Sender<()>,
    listener_task: JoinHandle<()>,
}

/// The server-side endpoint for one remote interface: a multithreaded
/// listener bound to an address, dispatching each accepted connection's call
/// to a server object implementing [`Service`].
///
/// Mirrors `distant_net::Server` + `TcpServerBuilder`/`TcpServerRef`, minus
/// the multiplexed-connection machinery this system has no use for (each
/// connection here carries exactly one call).
pub struct Skeleton<S: Service> {
    service: Arc<S>,
    address: Mutex<SocketAddr>,
    state: Arc<Mutex<SkeletonState>>,
    running: Mutex<Option<Running>>,
}

impl<S: Service> Skeleton<S> {
    /// Binds to an OS-assigned ephemeral port on `host` once `start()` is
    /// called; the real port is known only after binding, so `address()`
    /// returns port `0` until then.
    pub fn new(host: std::net::IpAddr, service: S) -> Self {
        Self::bind(SocketAddr::new(host, 0), service)
    }

    /// Binds to an explicit, fixed address.
    pub fn bind(address: SocketAddr, service: S) -> Self {
        Self {
            service: Arc::new(service),
            address: Mutex::new(address),
            state: Arc::new(Mutex::new(SkeletonState::Unstarted)),
            running: Mutex::new(None),
        }
    }

    pub fn state(&self) -> SkeletonState {
        *self.state.lock().unwrap()
    }

    pub fn address(&self) -> SocketAddr {
        *self.address.lock().unwrap()
    }

    /// Adjusts the bind address. Only meaningful before `start()`.
    pub fn set_address(&self, address: SocketAddr) {
        *self.address.lock().unwrap() = address;
    }

    pub fn service(&self) -> &Arc<S> {
        &self.service
    }

    /// Binds the listening socket and spawns the listener task. Returns
    /// immediately once the socket is bound; the listener itself runs on a
    /// background task.
    pub async fn start(&self) -> Result<(), io::Error> {
        {
            let mut state = self.state.lock().unwrap();
            if *state != SkeletonState::Unstarted {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "skeleton is not in the Unstarted state",
                ));
            }
            *state = SkeletonState::Running;
        }

        let bind_addr = self.address();
        let listener = TcpListener::bind(bind_addr).await?;
        let bound_addr = listener.local_addr()?;
        *self.address.lock().unwrap() = bound_addr;

        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();
        let service = Arc::clone(&self.service);
        let task_state = Arc::clone(&self.state);

        let listener_task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => {
                        break;
                    }
                    accepted = listener.accept() => {
                        match accepted {
                            Ok((stream, _peer)) => {
                                let service = Arc::clone(&service);
                                tokio::spawn(async move {
                                    serve_connection(service, stream).await;
                                });
                            }
                            Err(err) => {
                                if !service.listen_error(&err) {
                                    *task_state.lock().unwrap() = SkeletonState::Stopped;
                                    service.stopped(Some(&err));
                                    break;
                                }
                            }
                        }
                    }
                }
            }
        });

        *self.running.lock().unwrap() = Some(Running {
            shutdown: shutdown_tx,
            listener_task,
        });

        Ok(())
    }

    /// Closes the listening socket, releasing the listener. In-flight
    /// connection workers are allowed to run to completion. Idempotent:
    /// stopping a skeleton that isn't running is a no-op.
    pub async fn stop(&self) {
        let running = self.running.lock().unwrap().take();
        if let Some(running) = running {
            let _ = running.shutdown.send(());
            let _ = running.listener_task.await;
        }
        *self.state.lock().unwrap() = SkeletonState::Stopped;
        self.service.stopped(None);
    }
}

async fn serve_connection<S: Service>(service: Arc<S>, stream: TcpStream) {
    let mut transport = FramedTransport::new(stream);

    let request: Request<S::Request> = match transport.read_value().await {
        Ok(request) => request,
        Err(err) => {
            service.service_error(&io::Error::new(io::ErrorKind::InvalidData, err.to_string()));
            return;
        }
    };

    let outcome: Result<S::Response, RemoteFailure> = service.dispatch(request.payload).await;
    let response = Response::new(request.id, outcome);

    if let Err(err) = transport.write_value(&response).await {
        service.service_error(&io::Error::new(io::ErrorKind::Other, err.to_string()));
    }
}
