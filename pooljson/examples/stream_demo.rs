// Example: deserialize from a chunked source into a fixed buffer
//
// cargo run --example stream_demo

use pooljson::{
    ChunkReader, DeserializationError, DeserializeOptions, Document, NestingLimit, Reader,
};

/// Pretends to be a serial port delivering a few bytes at a time.
struct Uart<'a> {
    inner: ChunkReader<'a>,
    reads: usize,
}

impl Reader for Uart<'_> {
    type Error = ();

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        self.reads += 1;
        self.inner.read(buf)
    }
}

fn main() {
    let message = br#"{"id": 7, "cmd": 'set', "args": {"led": true, "level": 0.75}, "note": "caf\u00e9"}"#;

    let mut doc = Document::new([0u8; 256]);
    let mut uart = Uart {
        inner: ChunkReader::new(message, 5),
        reads: 0,
    };
    match doc.deserialize_reader(&mut uart, DeserializeOptions::new()) {
        Ok(used) => {
            let root = doc.root();
            println!("Parsed {} ({} pool bytes, {} reads)", root, used, uart.reads);
            println!("cmd = {}", root.get("cmd").as_str());
            println!("led = {}", root.get("args").get("led").as_bool());
            println!("note = {}", root.get("note").as_str());
        }
        Err(e) => println!("Failed: {}", e),
    }

    // A tiny pool or a tight nesting limit turn into errors, not panics
    let mut tiny = Document::new([0u8; 32]);
    let result = tiny.deserialize_reader(ChunkReader::new(message, 5), DeserializeOptions::new());
    assert_eq!(result, Err(DeserializationError::NoMemory));
    println!("32-byte pool: {:?}", result);

    let options = DeserializeOptions::new().with_nesting_limit(NestingLimit(1));
    let result = doc.deserialize_reader(ChunkReader::new(message, 5), options);
    assert_eq!(result, Err(DeserializationError::TooDeep));
    println!("Nesting limit 1: {:?}", result);
}
