// ----- standard library imports
// ----- extra library imports
use base64::{engine::general_purpose::STANDARD as B64, Engine as _};
use solana_sdk::{
    hash::Hash, instruction::Instruction, message::Message, pubkey::Pubkey,
    transaction::Transaction,
};
use solana_system_interface::instruction as system_instruction;
// ----- local imports
use crate::error::{Error, Result};
use crate::fees::FeeBreakdown;
use crate::route::RouteQuote;

// ----- end imports

/// ledger packet limit for a serialized transaction
pub const MAX_TRANSACTION_SIZE: usize = 1232;

/// Unsigned transaction: fee transfer first, route instructions after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedTransaction {
    pub instructions: Vec<Instruction>,
    pub fee_payer: Pubkey,
    pub recent_blockhash: Hash,
}

pub fn compose_transaction(
    fee: &FeeBreakdown,
    payer: &Pubkey,
    fee_recipient: &Pubkey,
    route: &RouteQuote,
    recent_blockhash: Hash,
) -> Result<ComposedTransaction> {
    if route.instructions.is_empty() {
        return Err(Error::CompositionFailed(format!(
            "route {} carries no instructions",
            route.route_id
        )));
    }
    if recent_blockhash == Hash::default() {
        return Err(Error::CompositionFailed(String::from(
            "missing recent blockhash",
        )));
    }
    let fee_transfer = system_instruction::transfer(payer, fee_recipient, fee.fee_amount);
    let mut instructions = Vec::with_capacity(route.instructions.len() + 1);
    instructions.push(fee_transfer);
    // route instructions depend on each other, relative order is kept as is
    instructions.extend(route.instructions.iter().cloned());
    Ok(ComposedTransaction {
        instructions,
        fee_payer: *payer,
        recent_blockhash,
    })
}

impl ComposedTransaction {
    /// every signature slot is left zero-filled
    pub fn to_transaction(&self) -> Transaction {
        let message = Message::new_with_blockhash(
            &self.instructions,
            Some(&self.fee_payer),
            &self.recent_blockhash,
        );
        Transaction::new_unsigned(message)
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        let tx = self.to_transaction();
        let bytes = bincode::serialize(&tx)?;
        if bytes.len() > MAX_TRANSACTION_SIZE {
            return Err(Error::CompositionFailed(format!(
                "transaction too large: {} > {} bytes",
                bytes.len(),
                MAX_TRANSACTION_SIZE
            )));
        }
        Ok(bytes)
    }

    pub fn to_base64(&self) -> Result<String> {
        let bytes = self.serialize()?;
        Ok(B64.encode(bytes))
    }
}
