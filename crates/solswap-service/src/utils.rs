// ----- standard library imports
// ----- extra library imports
use solana_sdk::{
    hash::Hash,
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
};
// ----- local imports
use crate::route::RouteQuote;

// ----- end imports

pub fn generate_instructions(n: usize) -> Vec<Instruction> {
    (0..n)
        .map(|i| {
            let seed = u8::try_from(i % 200).expect("seed fits u8") + 1;
            Instruction {
                program_id: Pubkey::new_from_array([seed; 32]),
                accounts: vec![AccountMeta::new(
                    Pubkey::new_from_array([seed.wrapping_add(50); 32]),
                    false,
                )],
                data: vec![seed, seed, seed],
            }
        })
        .collect()
}

pub fn generate_route(net_amount_in: u64, n_instructions: usize) -> RouteQuote {
    RouteQuote {
        route_id: String::from("test-route"),
        net_amount_in,
        amount_out: net_amount_in / 2,
        instructions: generate_instructions(n_instructions),
    }
}

pub fn blockhash() -> Hash {
    Hash::new_from_array([7u8; 32])
}

pub fn payer() -> Pubkey {
    Pubkey::new_from_array([201u8; 32])
}

pub fn fee_recipient() -> Pubkey {
    Pubkey::new_from_array([202u8; 32])
}

pub fn input_mint() -> Pubkey {
    Pubkey::new_from_array([203u8; 32])
}

pub fn output_mint() -> Pubkey {
    Pubkey::new_from_array([204u8; 32])
}
