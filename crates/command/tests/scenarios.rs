use std::io::{Read, Write};
use std::os::unix::net::UnixStream;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use execunit_command::Command;
use execunit_config::ChannelConfig;
use execunit_tlv::Tlv;

fn write_frame_raw(stream: &mut UnixStream, body: &[u8]) {
    stream.write_all(&(body.len() as u32).to_le_bytes()).unwrap();
    stream.write_all(body).unwrap();
    stream.flush().unwrap();
}

fn read_frame_raw(stream: &mut UnixStream) -> Vec<u8> {
    let mut len_buf = [0u8; 4];
    stream.read_exact(&mut len_buf).unwrap();
    let len = u32::from_le_bytes(len_buf) as usize;
    let mut body = vec![0u8; len];
    stream.read_exact(&mut body).unwrap();
    body
}

fn handshake(peer: &mut UnixStream) {
    write_frame_raw(peer, &Tlv::new_leaf(0x01, Vec::new()).unwrap().full_buffer());
}

#[test]
fn send_result_is_a_raw_leaf() {
    let (mut peer, ours) = UnixStream::pair().unwrap();
    handshake(&mut peer);
    let (command, _payload) = Command::connect(ours, &ChannelConfig::default()).unwrap();

    assert!(command.send_result(b"ok".to_vec()));

    let frame = read_frame_raw(&mut peer);
    let (tlv, consumed) = Tlv::parse(&frame).unwrap();
    assert_eq!(consumed, frame.len());
    assert_eq!(tlv.tlv_type(), 0x30);
    assert_eq!(tlv.as_bytes().unwrap(), b"ok");

    command.close();
}

#[test]
fn send_error_and_return_kinds() {
    let (mut peer, ours) = UnixStream::pair().unwrap();
    handshake(&mut peer);
    let (command, _payload) = Command::connect(ours, &ChannelConfig::default()).unwrap();

    assert!(command.send_error(b"boom".to_vec()));
    let (tlv, _) = Tlv::parse(&read_frame_raw(&mut peer)).unwrap();
    assert_eq!(tlv.tlv_type(), 0x32);
    assert_eq!(tlv.as_bytes().unwrap(), b"boom");

    assert!(command.send_return_success());
    let (tlv, _) = Tlv::parse(&read_frame_raw(&mut peer)).unwrap();
    assert_eq!(tlv.tlv_type(), 0x33);
    assert_eq!(tlv.as_bytes().unwrap(), Vec::<u8>::new());

    assert!(command.send_return_failed());
    let (tlv, _) = Tlv::parse(&read_frame_raw(&mut peer)).unwrap();
    assert_eq!(tlv.tlv_type(), 0x34);
    assert_eq!(tlv.as_bytes().unwrap(), Vec::<u8>::new());

    command.close();
}

#[test]
fn send_conf_ongoing_result_shape() {
    let (mut peer, ours) = UnixStream::pair().unwrap();
    handshake(&mut peer);
    let (command, _payload) = Command::connect(ours, &ChannelConfig::default()).unwrap();

    assert!(command.send_conf_ongoing_result());
    let (tlv, consumed) = Tlv::parse(&read_frame_raw(&mut peer)).unwrap();
    assert_eq!(consumed, tlv.full_size() as usize);
    assert_eq!(tlv.tlv_type(), 0x31);
    assert!(tlv.is_parent());
    assert_eq!(tlv.get_child(0x01, 0).unwrap().as_bytes().unwrap(), vec![0x01]);

    command.close();
}

#[test]
fn send_conf_stop_wait_shape() {
    let (mut peer, ours) = UnixStream::pair().unwrap();
    handshake(&mut peer);
    let (command, _payload) = Command::connect(ours, &ChannelConfig::default()).unwrap();

    assert!(command.send_conf_stop_wait(1500));
    let (tlv, _) = Tlv::parse(&read_frame_raw(&mut peer)).unwrap();
    assert_eq!(tlv.tlv_type(), 0x31);
    let ms = tlv.get_child(0x03, 0).unwrap().as_i32().unwrap();
    assert_eq!(ms, 1500);

    command.close();
}

#[test]
fn stop_sink_is_invoked_on_stop_tlv() {
    let (mut peer, ours) = UnixStream::pair().unwrap();
    handshake(&mut peer);
    let (command, _payload) = Command::connect(ours, &ChannelConfig::default()).unwrap();

    let stopped = Arc::new(AtomicBool::new(false));
    let target = stopped.clone();
    command.set_stop_sink(move || target.store(true, Ordering::SeqCst));

    write_frame_raw(&mut peer, &Tlv::new_leaf(0x3F, Vec::new()).unwrap().full_buffer());
    std::thread::sleep(Duration::from_millis(100));

    assert!(stopped.load(Ordering::SeqCst));
    command.close();
}

#[test]
fn new_data_sink_receives_leaf_payload() {
    let (mut peer, ours) = UnixStream::pair().unwrap();
    handshake(&mut peer);
    let (command, _payload) = Command::connect(ours, &ChannelConfig::default()).unwrap();

    let received: Arc<Mutex<Vec<Vec<u8>>>> = Arc::new(Mutex::new(Vec::new()));
    let target = received.clone();
    command.set_new_data_sink(move |data| target.lock().unwrap().push(data));

    write_frame_raw(
        &mut peer,
        &Tlv::new_leaf(0x39, b"incoming".to_vec()).unwrap().full_buffer(),
    );
    std::thread::sleep(Duration::from_millis(100));

    assert_eq!(received.lock().unwrap().as_slice(), &[b"incoming".to_vec()]);
    command.close();
}

#[test]
fn unrecognized_top_level_type_does_not_sever_the_channel() {
    let (mut peer, ours) = UnixStream::pair().unwrap();
    handshake(&mut peer);
    let (command, _payload) = Command::connect(ours, &ChannelConfig::default()).unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let target = calls.clone();
    command.set_new_data_sink(move |_| {
        target.fetch_add(1, Ordering::SeqCst);
    });

    write_frame_raw(&mut peer, &Tlv::new_leaf(0x7E, Vec::new()).unwrap().full_buffer());
    write_frame_raw(
        &mut peer,
        &Tlv::new_leaf(0x39, b"x".to_vec()).unwrap().full_buffer(),
    );
    std::thread::sleep(Duration::from_millis(100));

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(command.is_active());
    command.close();
}
