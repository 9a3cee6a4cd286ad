//! Room engine error types.

use crate::{game::DealError, wallet::WalletError};
use thiserror::Error;

/// Coarse classification used by callers to pick a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    InsufficientFunds,
    InsufficientParticipants,
    DeckExhausted,
    Invalid,
    Internal,
}

/// Room engine errors
#[derive(Debug, Error)]
pub enum RoomError {
    /// Room missing or deactivated
    #[error("Room not found")]
    NotFound,

    /// Caller has no active membership
    #[error("User not in a room")]
    NotMember,

    #[error("Room is full")]
    Full,

    /// Caller already sits in the requested room
    #[error("User already in this room")]
    AlreadyMember,

    /// Caller already sits in some other room
    #[error("User already in another room")]
    AlreadyElsewhere,

    /// No unused join code could be allocated
    #[error("Could not allocate a unique join code")]
    DuplicateCode,

    #[error("Game already in progress")]
    GameInProgress,

    #[error("Insufficient balance: available {available}, required {required}")]
    InsufficientFunds { required: i64, available: i64 },

    #[error("Not enough funded players: {funded} funded, {required} required")]
    InsufficientParticipants { funded: usize, required: usize },

    #[error("Deck exhausted: {requested} cards requested, {available} available")]
    DeckExhausted { requested: usize, available: usize },

    #[error("Invalid stake: {0}")]
    InvalidStake(i64),

    #[error("Invalid join code")]
    InvalidCode,

    #[error("Wallet error: {0}")]
    Wallet(WalletError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl RoomError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RoomError::NotFound | RoomError::NotMember => ErrorKind::NotFound,
            RoomError::Full
            | RoomError::AlreadyMember
            | RoomError::AlreadyElsewhere
            | RoomError::DuplicateCode
            | RoomError::GameInProgress => ErrorKind::Conflict,
            RoomError::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            RoomError::InsufficientParticipants { .. } => ErrorKind::InsufficientParticipants,
            RoomError::DeckExhausted { .. } => ErrorKind::DeckExhausted,
            RoomError::InvalidStake(_) | RoomError::InvalidCode => ErrorKind::Invalid,
            RoomError::Wallet(WalletError::InvalidAmount(_)) => ErrorKind::Invalid,
            RoomError::Wallet(WalletError::DuplicateTransaction(_)) => ErrorKind::Conflict,
            RoomError::Wallet(_) | RoomError::Database(_) => ErrorKind::Internal,
        }
    }

    /// Get a client-safe error message
    ///
    /// Store errors are sanitized so SQL details never reach a client.
    pub fn client_message(&self) -> String {
        match self {
            RoomError::Database(_) => "Internal server error".to_string(),
            RoomError::Wallet(e) => e.client_message(),
            RoomError::InsufficientFunds { .. } => "Insufficient balance".to_string(),
            _ => self.to_string(),
        }
    }
}

impl From<WalletError> for RoomError {
    fn from(err: WalletError) -> Self {
        match err {
            WalletError::InsufficientBalance {
                available,
                required,
                ..
            } => RoomError::InsufficientFunds {
                required,
                available,
            },
            WalletError::Database(e) => RoomError::Database(e),
            other => RoomError::Wallet(other),
        }
    }
}

impl From<DealError> for RoomError {
    fn from(err: DealError) -> Self {
        match err {
            DealError::DeckExhausted {
                requested,
                available,
            } => RoomError::DeckExhausted {
                requested,
                available,
            },
        }
    }
}

/// Result type for room operations
pub type RoomResult<T> = Result<T, RoomError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(RoomError::NotFound.kind(), ErrorKind::NotFound);
        assert_eq!(RoomError::NotMember.kind(), ErrorKind::NotFound);
        assert_eq!(RoomError::Full.kind(), ErrorKind::Conflict);
        assert_eq!(RoomError::AlreadyElsewhere.kind(), ErrorKind::Conflict);
        assert_eq!(RoomError::DuplicateCode.kind(), ErrorKind::Conflict);
        assert_eq!(
            RoomError::InsufficientParticipants {
                funded: 1,
                required: 2
            }
            .kind(),
            ErrorKind::InsufficientParticipants
        );
        assert_eq!(RoomError::InvalidCode.kind(), ErrorKind::Invalid);
        assert_eq!(
            RoomError::Database(sqlx::Error::PoolTimedOut).kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn test_wallet_shortfall_becomes_insufficient_funds() {
        let err: RoomError = WalletError::InsufficientBalance {
            user_id: 3,
            available: 5,
            required: 10,
        }
        .into();
        assert!(matches!(
            err,
            RoomError::InsufficientFunds {
                required: 10,
                available: 5
            }
        ));
        assert_eq!(err.client_message(), "Insufficient balance");
    }

    #[test]
    fn test_client_messages() {
        assert_eq!(RoomError::Full.client_message(), "Room is full");
        assert_eq!(
            RoomError::Database(sqlx::Error::PoolClosed).client_message(),
            "Internal server error"
        );
        let err: RoomError = WalletError::WalletNotFound(9).into();
        assert_eq!(err.client_message(), "Wallet not found");
    }

    #[test]
    fn test_deal_error_conversion() {
        let err: RoomError = DealError::DeckExhausted {
            requested: 54,
            available: 52,
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::DeckExhausted);
    }
}
