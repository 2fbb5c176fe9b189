//! MIDI Input Manager
//!
//! Handles MIDI device enumeration, connection, and event routing.
//! Uses dedicated thread for platform thread-safety.

use super::adapter::MidiBusAdapter;
use crate::error::{Error, Result};
use arc_swap::ArcSwap;
use crossbeam_channel::{bounded, Receiver, Sender};
use midir::{MidiInput, MidiInputConnection};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, warn};

const CLIENT_NAME: &str = "mivi-midi-input";

/// Information about an available MIDI input device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MidiInputDevice {
    /// Device index (for connection)
    pub index: usize,
    /// Device name
    pub name: String,
}

/// Commands sent to the MIDI thread
enum MidiCommand {
    Connect {
        device_index: usize,
        reply: Sender<Result<String>>,
    },
    Disconnect,
    Shutdown,
}

/// Owns the hardware connection and feeds its messages through a
/// [`MidiBusAdapter`].
pub struct MidiInputManager {
    command_sender: Sender<MidiCommand>,
    connected_device: Arc<ArcSwap<Option<String>>>,
    is_connected: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl MidiInputManager {
    pub fn new(adapter: Arc<MidiBusAdapter>) -> Result<Self> {
        let (command_sender, command_receiver) = bounded(16);
        let connected_device = Arc::new(ArcSwap::from_pointee(None));
        let is_connected = Arc::new(AtomicBool::new(false));

        let connected_device_clone = Arc::clone(&connected_device);
        let is_connected_clone = Arc::clone(&is_connected);

        let thread = thread::Builder::new()
            .name("mivi-midi".to_string())
            .spawn(move || {
                Self::midi_thread(
                    command_receiver,
                    adapter,
                    connected_device_clone,
                    is_connected_clone,
                );
            })
            .map_err(Error::Timer)?;

        Ok(Self {
            command_sender,
            connected_device,
            is_connected,
            thread: Some(thread),
        })
    }

    fn midi_thread(
        command_receiver: Receiver<MidiCommand>,
        adapter: Arc<MidiBusAdapter>,
        connected_device: Arc<ArcSwap<Option<String>>>,
        is_connected: Arc<AtomicBool>,
    ) {
        let mut connection: Option<MidiInputConnection<()>> = None;

        let close = |connection: &mut Option<MidiInputConnection<()>>| {
            if let Some(conn) = connection.take() {
                conn.close();
                is_connected.store(false, Ordering::SeqCst);
                connected_device.store(Arc::new(None));
                debug!("MIDI input disconnected");
            }
        };

        loop {
            match command_receiver.recv_timeout(Duration::from_millis(100)) {
                Ok(MidiCommand::Connect {
                    device_index,
                    reply,
                }) => {
                    close(&mut connection);

                    let result = Self::connect_to_device(device_index, adapter.clone());
                    let reply_value = match result {
                        Ok((conn, name)) => {
                            connection = Some(conn);
                            is_connected.store(true, Ordering::SeqCst);
                            connected_device.store(Arc::new(Some(name.clone())));
                            debug!("MIDI input connected: {}", name);
                            Ok(name)
                        }
                        Err(e) => {
                            warn!("MIDI connection to device {} failed: {}", device_index, e);
                            Err(e)
                        }
                    };
                    let _ = reply.send(reply_value);
                }
                Ok(MidiCommand::Disconnect) => close(&mut connection),
                Ok(MidiCommand::Shutdown) => {
                    close(&mut connection);
                    break;
                }
                Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                    // No command, continue running
                }
                Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                    close(&mut connection);
                    break;
                }
            }
        }
    }

    fn connect_to_device(
        device_index: usize,
        adapter: Arc<MidiBusAdapter>,
    ) -> Result<(MidiInputConnection<()>, String)> {
        let midi_input = MidiInput::new(CLIENT_NAME)?;

        let ports = midi_input.ports();
        let port = ports
            .get(device_index)
            .ok_or_else(|| Error::MidiDevice(format!("MIDI device {} not found", device_index)))?;

        let port_name = midi_input
            .port_name(port)
            .unwrap_or_else(|_| format!("Device {}", device_index));

        let connection = midi_input.connect(
            port,
            "mivi-input",
            move |_timestamp, message, _| adapter.handle_bytes(message),
            (),
        )?;

        Ok((connection, port_name))
    }

    pub fn list_devices() -> Vec<MidiInputDevice> {
        let mut devices = Vec::new();
        if let Ok(midi_input) = MidiInput::new("mivi-device-list") {
            let ports = midi_input.ports();
            for (index, port) in ports.iter().enumerate() {
                let name = midi_input
                    .port_name(port)
                    .unwrap_or_else(|_| format!("Unknown Device {}", index));
                devices.push(MidiInputDevice { index, name });
            }
        }
        devices
    }

    /// Connect to a device and wait for the outcome. Returns the port name.
    pub fn connect(&self, device_index: usize) -> Result<String> {
        let (reply, response) = bounded(1);
        self.command_sender
            .send(MidiCommand::Connect {
                device_index,
                reply,
            })
            .map_err(|_| Error::MidiDevice("MIDI thread not running".to_string()))?;
        response
            .recv()
            .map_err(|_| Error::MidiDevice("MIDI thread stopped during connect".to_string()))?
    }

    /// Connect to the first device whose name contains `name`, ignoring case.
    pub fn connect_by_name(&self, name: &str) -> Result<String> {
        let devices = Self::list_devices();
        let device = devices
            .iter()
            .find(|d| d.name.to_lowercase().contains(&name.to_lowercase()))
            .ok_or_else(|| Error::MidiDevice(format!("No MIDI device matching '{}' found", name)))?;
        self.connect(device.index)
    }

    pub fn disconnect(&self) {
        let _ = self.command_sender.send(MidiCommand::Disconnect);
    }

    pub fn is_connected(&self) -> bool {
        self.is_connected.load(Ordering::SeqCst)
    }

    pub fn connected_device_name(&self) -> Option<String> {
        self.connected_device.load().as_ref().clone()
    }
}

impl Drop for MidiInputManager {
    fn drop(&mut self) {
        let _ = self.command_sender.send(MidiCommand::Shutdown);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
