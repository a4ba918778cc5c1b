use tracing_subscriber::EnvFilter;
use wah_bitmap::{
    BitmapRead, BitmapWrite, CompressedBitmap, CompressedBitmapBuilder, testutil::OffsetGen,
};

fn main() {
    // RUST_LOG=wah_bitmap=trace shows every fill split and normalization
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut offset_gen = OffsetGen::new(0xDEAD_BEEF);

    // build an index of a few dense clusters in increasing order
    let mut clusters = offset_gen.clustered(8, 1 << 20, 200);
    clusters.sort_unstable();
    let mut builder = CompressedBitmapBuilder::from_iter(clusters);

    // then scatter some edits across the existing words
    for offset in offset_gen.random(32, 1 << 20) {
        builder.set(offset);
    }
    let sixth = builder.iter().nth(5).unwrap();
    builder.clear(sixth);

    let bitmap = builder.to_bitmap();
    println!(
        "{} bits set in {} words, bounds {}",
        bitmap.count_bits(),
        bitmap.count(),
        bitmap.bounds()
    );

    // serialize the bitmap; the bytes are just the little-endian words
    let bytes = bitmap.to_bytes();
    println!("Serialized bitmap size: {} bytes", bytes.len());
    println!("First 16 bytes of serialized bitmap:");
    for byte in bytes.iter().take(16) {
        print!("{byte:02X} ");
    }
    println!();

    // reopen it without copying and check that nothing was lost
    let reopened = CompressedBitmap::from_bytes(bytes).unwrap();
    assert_eq!(bitmap, reopened);
    assert!(reopened.iter().eq(builder.iter()));

    println!("{}", reopened.dump().lines().take(8).collect::<Vec<_>>().join("\n"));
}
