use shared::models::payload::{ReceiptEvent, Transaction};

/// Pulls numeric amounts (in micro-STX) out of delivered transactions.
///
/// The marketplace contract's print-event layout is not decoded yet, so the
/// listener ships with [`NoAmounts`]. Any amount an implementation returns is
/// added to the matching running total.
pub trait AmountExtractor: Send + Sync {
    /// Price paid by a `buy-nft` call.
    fn sale_amount(&self, tx: &Transaction) -> Option<u64>;

    /// Platform fee carried by a fee print event.
    fn platform_fee(&self, event: &ReceiptEvent) -> Option<u64>;

    /// Royalty carried by a fee print event.
    fn royalty_fee(&self, event: &ReceiptEvent) -> Option<u64>;
}

/// Extractor that never yields an amount. Volume and fee totals stay at zero.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoAmounts;

impl AmountExtractor for NoAmounts {
    fn sale_amount(&self, _tx: &Transaction) -> Option<u64> {
        None
    }

    fn platform_fee(&self, _event: &ReceiptEvent) -> Option<u64> {
        None
    }

    fn royalty_fee(&self, _event: &ReceiptEvent) -> Option<u64> {
        None
    }
}
