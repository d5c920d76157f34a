use std::io::{Read, Write};
use std::os::unix::net::UnixStream;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use execunit_config::ChannelConfig;
use execunit_listener::Listener;
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

fn response_frame(msg_type: u8, seq: i32, data: Option<&[u8]>) -> Vec<u8> {
    let mut resp = Tlv::new_parent(msg_type).unwrap();
    resp.add_child(Tlv::new_leaf(0x02, seq.to_le_bytes().to_vec()).unwrap())
        .unwrap();
    if let Some(data) = data {
        resp.add_child(Tlv::new_leaf(0x04, data.to_vec()).unwrap())
            .unwrap();
    }
    resp.full_buffer()
}

#[test]
fn response_is_correlated_to_its_request_by_sequence() {
    let (mut peer, ours) = UnixStream::pair().unwrap();
    handshake(&mut peer);

    let (listener, _payload) = Listener::connect(ours, &ChannelConfig::default()).unwrap();

    let caller = {
        let listener = listener.clone();
        std::thread::spawn(move || listener.get_metadata())
    };

    // The request frame's sequence child tells us which id to respond to.
    let request = read_frame_raw(&mut peer);
    let (request_tlv, _) = Tlv::parse(&request).unwrap();
    assert_eq!(request_tlv.tlv_type(), 0x21);
    let seq = request_tlv.get_child(0x02, 0).unwrap().as_i32().unwrap();
    assert_eq!(seq, 1); // sequence counter starts at 1

    write_frame_raw(&mut peer, &response_frame(0x21, seq, Some(b"M")));

    let result = caller.join().unwrap();
    assert_eq!(result, Some(b"M".to_vec()));

    listener.close();
}

#[test]
fn early_response_does_not_block_the_caller() {
    let (mut peer, ours) = UnixStream::pair().unwrap();
    handshake(&mut peer);

    let (listener, _payload) = Listener::connect(ours, &ChannelConfig::default()).unwrap();

    // Peer answers sequence 5 before anyone has asked for it.
    write_frame_raw(&mut peer, &response_frame(0x21, 5, Some(b"early")));
    std::thread::sleep(Duration::from_millis(100)); // let the pump store it

    let result = listener.wait_for_response(5, Some(Duration::from_millis(500)));
    assert_eq!(result, Some(b"early".to_vec()));

    listener.close();
}

#[test]
fn wait_for_response_times_out_and_clears_the_waker() {
    let (mut peer, ours) = UnixStream::pair().unwrap();
    handshake(&mut peer);

    let (listener, _payload) = Listener::connect(ours, &ChannelConfig::default()).unwrap();

    let started = std::time::Instant::now();
    let result = listener.wait_for_response(42, Some(Duration::from_millis(50)));
    assert_eq!(result, None);
    assert!(started.elapsed() >= Duration::from_millis(50));

    // A response arriving after the timeout for the same id simply lingers
    // in the map until dispose; it must not retroactively unblock the
    // already-returned caller.
    write_frame_raw(&mut peer, &response_frame(0x21, 42, Some(b"late")));
    std::thread::sleep(Duration::from_millis(100));

    listener.close();
}

#[test]
fn response_with_no_data_child_yields_none() {
    let (mut peer, ours) = UnixStream::pair().unwrap();
    handshake(&mut peer);

    let (listener, _payload) = Listener::connect(ours, &ChannelConfig::default()).unwrap();

    write_frame_raw(&mut peer, &response_frame(0x22, 7, None));
    std::thread::sleep(Duration::from_millis(100));

    let result = listener.wait_for_response(7, Some(Duration::from_millis(200)));
    assert_eq!(result, None);

    listener.close();
}

#[test]
fn callback_dispatches_to_user_sink() {
    let (mut peer, ours) = UnixStream::pair().unwrap();
    handshake(&mut peer);

    let (listener, _payload) = Listener::connect(ours, &ChannelConfig::default()).unwrap();

    let received: Arc<Mutex<Vec<Vec<u8>>>> = Arc::new(Mutex::new(Vec::new()));
    let sink_target = received.clone();
    listener.set_callback(move |data| sink_target.lock().unwrap().push(data));

    let mut callback = Tlv::new_parent(0x20).unwrap();
    callback
        .add_child(Tlv::new_leaf(0x04, b"push".to_vec()).unwrap())
        .unwrap();
    write_frame_raw(&mut peer, &callback.full_buffer());
    std::thread::sleep(Duration::from_millis(100));

    assert_eq!(received.lock().unwrap().as_slice(), &[b"push".to_vec()]);

    listener.close();
}

#[test]
fn new_data_from_c2_sends_fire_and_forget_leaf() {
    let (mut peer, ours) = UnixStream::pair().unwrap();
    handshake(&mut peer);

    let (listener, _payload) = Listener::connect(ours, &ChannelConfig::default()).unwrap();

    assert!(listener.new_data_from_c2(vec![0xAA, 0xBB]));

    let frame = read_frame_raw(&mut peer);
    let (tlv, consumed) = Tlv::parse(&frame).unwrap();
    assert_eq!(consumed, frame.len());
    assert_eq!(tlv.tlv_type(), 0x23);
    assert_eq!(tlv.as_bytes().unwrap(), vec![0xAA, 0xBB]);

    listener.close();
}

#[test]
fn close_is_idempotent() {
    let (mut peer, ours) = UnixStream::pair().unwrap();
    handshake(&mut peer);

    let (listener, _payload) = Listener::connect(ours, &ChannelConfig::default()).unwrap();
    listener.close();
    listener.close();
    assert!(!listener.is_active());
}
