// Decompression of archived boat files

use crate::core::constants::CompressionType;
use crate::core::error::{Result, StatsError};
use flate2::read::ZlibDecoder;
use std::io::Read;

pub fn decompress(data: &[u8], compression: CompressionType) -> Result<Vec<u8>> {
    match compression {
        CompressionType::None => Ok(data.to_vec()),

        CompressionType::Zlib => {
            let mut decoder = ZlibDecoder::new(data);
            let mut decompressed = Vec::new();
            decoder
                .read_to_end(&mut decompressed)
                .map_err(|e| StatsError::DecompressionFailed(format!("Zlib: {}", e)))?;
            Ok(decompressed)
        }

        #[cfg(feature = "lz4")]
        CompressionType::Lz4 => {
            // size-prefixed block, as written by lz4::block::compress(.., true)
            lz4::block::decompress(data, None)
                .map_err(|e| StatsError::DecompressionFailed(format!("LZ4: {}", e)))
        }

        #[cfg(not(feature = "lz4"))]
        CompressionType::Lz4 => Err(StatsError::UnsupportedCompression(
            "lz4 support not compiled in".into(),
        )),

        #[cfg(feature = "zstd")]
        CompressionType::Zstd => {
            zstd::decode_all(data)
                .map_err(|e| StatsError::DecompressionFailed(format!("Zstd: {}", e)))
        }

        #[cfg(not(feature = "zstd"))]
        CompressionType::Zstd => Err(StatsError::UnsupportedCompression(
            "zstd support not compiled in".into(),
        )),
    }
}
