//! SRP-6a implementation for HomeKit pair-setup.
//!
//! Uses 3072-bit prime (RFC 5054), generator g=5, SHA-512.

use crate::keys::SharedSecret;
use hap_core::error::CryptoError;
use num_bigint::BigUint;
use sha2::{Digest, Sha512};
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// N size in bytes (3072 bits = 384 bytes).
pub const N_BYTES: usize = 384;

/// Identity string used by HomeKit pair-setup.
pub const PAIR_SETUP_IDENTITY: &[u8] = b"Pair-Setup";

/// RFC 5054 3072-bit prime N as hex string.
const RFC5054_N_3072: &str = concat!(
    "FFFFFFFFFFFFFFFFC90FDAA22168C234C4C6628B80DC1CD129024E08",
    "8A67CC74020BBEA63B139B22514A08798E3404DDEF9519B3CD3A431B",
    "302B0A6DF25F14374FE1356D6D51C245E485B576625E7EC6F44C42E9",
    "A637ED6B0BFF5CB6F406B7EDEE386BFB5A899FA5AE9F24117C4B1FE6",
    "49286651ECE45B3DC2007CB8A163BF0598DA48361C55D39A69163FA8",
    "FD24CF5F83655D23DCA3AD961C62F356208552BB9ED529077096966D",
    "670C354E4ABC9804F1746C08CA18217C32905E462E36CE3BE39E772C",
    "180E86039B2783A2EC07A28FB5C55DF06F4C52C9DE2BCBF695581718",
    "3995497CEA956AE515D2261898FA051015728E5A8AAAC42DAD33170D",
    "04507A33A85521ABDF1CBA64ECFB850458DBEF0A8AEA71575D060C7D",
    "B3970F85A6E1E4C7ABF5AE8CDB0933D71E8C94E04A25619DCEE3D226",
    "1AD2EE6BF12FFA06D98A0864D87602733EC86A64521F2B18177B200C",
    "BBE117577A615D6C770988C0BAD946E208E24FA074E5AB3143DB5BFC",
    "E0FD108E4B82D120A93AD2CAFFFFFFFFFFFFFFFF"
);

/// SRP-6a group parameters (3072-bit, RFC 5054).
#[derive(Debug, Clone)]
pub struct SrpParams {
    /// Prime modulus N.
    pub n: BigUint,
    /// Generator g (always 5).
    pub g: BigUint,
}

impl Default for SrpParams {
    fn default() -> Self {
        // The constant is valid hex, so parsing only fails if it is edited.
        let n = BigUint::parse_bytes(RFC5054_N_3072.as_bytes(), 16).unwrap_or_default();
        let g = BigUint::from(5u32);
        Self { n, g }
    }
}

/// Accessory challenge from M2.
pub struct SrpChallenge<'a> {
    pub salt: &'a [u8],
    pub server_public_key: &'a [u8],
}

/// Client side of one SRP exchange.
///
/// Built once the accessory's salt and public value are known; computes the
/// client public value, the client proof, the expected accessory proof and
/// the shared secret up front.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SrpClient {
    #[zeroize(skip)]
    params: SrpParams,
    identity: Vec<u8>,
    password: Vec<u8>,
    private_key: Vec<u8>,
    salt: Vec<u8>,
    #[zeroize(skip)]
    public_key: BigUint,
    client_proof: Vec<u8>,
    expected_server_proof: Vec<u8>,
    shared_secret: SharedSecret,
}

impl SrpClient {
    /// Run the client key agreement against an accessory challenge.
    ///
    /// `private_key` is the ephemeral secret exponent `a`.
    pub fn new(
        params: SrpParams,
        identity: &[u8],
        password: &[u8],
        private_key: &[u8],
        challenge: &SrpChallenge<'_>,
    ) -> Result<Self, CryptoError> {
        if challenge.server_public_key.len() > N_BYTES {
            return Err(CryptoError::InvalidSrpParameter(format!(
                "server public key too long: {} (expected <= {})",
                challenge.server_public_key.len(),
                N_BYTES
            )));
        }

        let b = BigUint::from_bytes_be(challenge.server_public_key);
        if &b % &params.n == BigUint::ZERO {
            return Err(CryptoError::InvalidSrpParameter(
                "server public key: B mod N = 0".to_string(),
            ));
        }

        let a = BigUint::from_bytes_be(private_key);
        if a == BigUint::ZERO {
            return Err(CryptoError::InvalidSrpParameter(
                "private key is zero".to_string(),
            ));
        }

        // A = g^a mod N
        let public_key = params.g.modpow(&a, &params.n);

        // u = H(PAD(A) || PAD(B))
        let u = compute_u(&public_key, &b);
        if u == BigUint::ZERO {
            return Err(CryptoError::InvalidSrpParameter("u = 0".to_string()));
        }

        let x = compute_x(challenge.salt, identity, password);
        let k = compute_k(&params);

        // S = (B - k * g^x)^(a + u*x) mod N
        let g_x = params.g.modpow(&x, &params.n);
        let k_gx = (&k * &g_x) % &params.n;
        let base = if b >= k_gx {
            (&b - &k_gx) % &params.n
        } else {
            (&b + &params.n - &k_gx) % &params.n
        };
        let exponent = &a + &u * &x;
        let s = base.modpow(&exponent, &params.n);

        // K = H(S)
        let mut hasher = Sha512::new();
        hasher.update(pad_to_n(&s));
        let shared_secret = hasher.finalize().to_vec();

        let client_proof = compute_m1(
            &params,
            identity,
            challenge.salt,
            &public_key,
            &b,
            &shared_secret,
        );

        // M2 = H(PAD(A) || M1 || K)
        let mut hasher = Sha512::new();
        hasher.update(pad_to_n(&public_key));
        hasher.update(&client_proof);
        hasher.update(&shared_secret);
        let expected_server_proof = hasher.finalize().to_vec();

        Ok(Self {
            params,
            identity: identity.to_vec(),
            password: password.to_vec(),
            private_key: private_key.to_vec(),
            salt: challenge.salt.to_vec(),
            public_key,
            client_proof,
            expected_server_proof,
            shared_secret: SharedSecret::new(shared_secret),
        })
    }

    /// Client public value A (384 bytes).
    pub fn public_key(&self) -> Vec<u8> {
        pad_to_n(&self.public_key)
    }

    /// Client proof M1 (64 bytes).
    pub fn client_proof(&self) -> &[u8] {
        &self.client_proof
    }

    /// Check the accessory's proof M2 in constant time.
    pub fn verify_server_proof(&self, proof: &[u8]) -> Result<(), CryptoError> {
        if bool::from(proof.ct_eq(&self.expected_server_proof)) {
            Ok(())
        } else {
            Err(CryptoError::ProofMismatch)
        }
    }

    /// Shared secret K = H(S) (64 bytes).
    pub fn shared_secret(&self) -> &SharedSecret {
        &self.shared_secret
    }

    /// Salt the verifier was computed with.
    pub fn salt(&self) -> &[u8] {
        &self.salt
    }

    /// Group parameters in use.
    pub fn params(&self) -> &SrpParams {
        &self.params
    }
}

/// Compute M1 = H(H(N) XOR H(g) || H(I) || salt || PAD(A) || PAD(B) || K)
fn compute_m1(
    params: &SrpParams,
    identity: &[u8],
    salt: &[u8],
    a: &BigUint,
    b: &BigUint,
    k: &[u8],
) -> Vec<u8> {
    let h_n = Sha512::digest(pad_to_n(&params.n));

    // H(g) is over the raw generator bytes, unlike k = H(N || PAD(g)).
    let h_g = Sha512::digest(params.g.to_bytes_be());

    let mut xor_result = [0u8; 64];
    for (out, (n, g)) in xor_result.iter_mut().zip(h_n.iter().zip(h_g.iter())) {
        *out = n ^ g;
    }

    let h_i = Sha512::digest(identity);

    let mut hasher = Sha512::new();
    hasher.update(xor_result);
    hasher.update(h_i);
    hasher.update(salt);
    hasher.update(pad_to_n(a));
    hasher.update(pad_to_n(b));
    hasher.update(k);
    hasher.finalize().to_vec()
}

/// Pad BigUint to N_BYTES with leading zeros.
pub fn pad_to_n(value: &BigUint) -> Vec<u8> {
    let bytes = value.to_bytes_be();
    if bytes.len() >= N_BYTES {
        bytes[bytes.len() - N_BYTES..].to_vec()
    } else {
        let mut padded = vec![0u8; N_BYTES - bytes.len()];
        padded.extend_from_slice(&bytes);
        padded
    }
}

/// Compute k = SHA512(N || PAD(g)).
fn compute_k(params: &SrpParams) -> BigUint {
    let mut hasher = Sha512::new();
    hasher.update(pad_to_n(&params.n));
    hasher.update(pad_to_n(&params.g));
    BigUint::from_bytes_be(&hasher.finalize())
}

/// Compute u = SHA512(PAD(A) || PAD(B)).
fn compute_u(a: &BigUint, b: &BigUint) -> BigUint {
    let mut hasher = Sha512::new();
    hasher.update(pad_to_n(a));
    hasher.update(pad_to_n(b));
    BigUint::from_bytes_be(&hasher.finalize())
}

/// Compute x = SHA512(salt || SHA512(identity || ":" || password)).
fn compute_x(salt: &[u8], identity: &[u8], password: &[u8]) -> BigUint {
    let mut hasher = Sha512::new();
    hasher.update(identity);
    hasher.update(b":");
    hasher.update(password);
    let inner_hash = hasher.finalize();

    let mut hasher = Sha512::new();
    hasher.update(salt);
    hasher.update(inner_hash);
    BigUint::from_bytes_be(&hasher.finalize())
}
