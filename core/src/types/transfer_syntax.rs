//! Transfer syntaxes whose pixel data needs no decompression

pub const IMPLICIT_VR_LITTLE_ENDIAN: &str = "1.2.840.10008.1.2";
pub const EXPLICIT_VR_LITTLE_ENDIAN: &str = "1.2.840.10008.1.2.1";
pub const DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN: &str = "1.2.840.10008.1.2.1.99";
pub const EXPLICIT_VR_BIG_ENDIAN: &str = "1.2.840.10008.1.2.2";

/// The four canonical uncompressed transfer syntaxes
pub const UNCOMPRESSED_TRANSFER_SYNTAXES: [&str; 4] = [
    EXPLICIT_VR_LITTLE_ENDIAN,
    IMPLICIT_VR_LITTLE_ENDIAN,
    DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN,
    EXPLICIT_VR_BIG_ENDIAN,
];

/// Returns whether the transfer syntax stores pixel data uncompressed
///
/// Trailing padding (space or NUL) is ignored.
pub fn is_uncompressed(uid: &str) -> bool {
    let uid = uid.trim_end_matches(['\0', ' ']);
    UNCOMPRESSED_TRANSFER_SYNTAXES.contains(&uid)
}
