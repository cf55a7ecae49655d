//! CLI tool to sign cheques and bounties for the core token family.
//!
//! The signed record is printed as JSON, ready to be submitted by a spender
//! (`cashCheque`) or an executor (`claimBounty`):
//! - `cheque`: authorize `spender` to move `amount` of the owner's tokens
//! - `bounty`: reward whoever executes `data` against `target` on the owner's behalf

use alloy_primitives::{Address, Bytes, U256};
use authorization::{domain, typed, Authorization, SignedBounty, SignedCheque, DOMAIN_VERSION};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "sign", version)]
#[command(about = "Sign cheques and bounties as EIP-712 typed data")]
struct Cli {
    /// Private key of the owner (hex string, with or without 0x prefix)
    #[arg(short = 'k', long, env = "PRIVATE_KEY", hide_env_values = true)]
    private_key: String,

    /// Token contract that verifies the signature
    #[arg(long)]
    token: String,

    /// EIP-712 domain name of the token
    #[arg(long)]
    name: String,

    /// EIP-712 domain version of the token
    #[arg(long, default_value = DOMAIN_VERSION)]
    domain_version: String,

    #[arg(long)]
    chain_id: u64,

    /// Replay-protection nonce (decimal or 0x-prefixed hex)
    #[arg(long)]
    nonce: String,

    /// Unix timestamp after which the record is rejected
    #[arg(long)]
    deadline: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign a cheque
    Cheque {
        #[arg(long)]
        spender: String,

        /// Amount in token base units
        #[arg(long)]
        amount: String,
    },

    /// Sign a bounty
    Bounty {
        #[arg(long)]
        target: String,

        /// Hex-encoded call data
        #[arg(long, default_value = "0x")]
        data: String,

        /// Reward in token base units
        #[arg(long)]
        reward: String,

        /// Gas the executor must forward to the target
        #[arg(long)]
        energy: u64,
    },
}

fn parse_address(name: &str, value: &str) -> eyre::Result<Address> {
    value
        .parse()
        .map_err(|e| eyre::eyre!("invalid {name} {value}: {e}"))
}

fn parse_amount(name: &str, value: &str) -> eyre::Result<U256> {
    value
        .parse()
        .map_err(|e| eyre::eyre!("invalid {name} {value}: {e}"))
}

fn main() -> eyre::Result<()> {
    let cli = Cli::parse();

    let signer = client::parse_private_key(&cli.private_key)?;
    let owner = signer.address();
    let domain = domain(
        cli.name,
        cli.domain_version,
        cli.chain_id,
        parse_address("token", &cli.token)?,
    );
    let nonce = parse_amount("nonce", &cli.nonce)?;
    let deadline = U256::from(cli.deadline);

    let json = match cli.command {
        Command::Cheque { spender, amount } => {
            let cheque = typed::Cheque {
                owner,
                spender: parse_address("spender", &spender)?,
                amount: parse_amount("amount", &amount)?,
                nonce,
                deadline,
            };
            let signed = SignedCheque::sign(cheque, &domain, &signer)?;
            signed.verify(&domain)?;
            serde_json::to_string_pretty(&signed)?
        }
        Command::Bounty {
            target,
            data,
            reward,
            energy,
        } => {
            let data: Bytes = data
                .parse()
                .map_err(|e| eyre::eyre!("invalid data {data}: {e}"))?;
            let bounty = typed::Bounty {
                owner,
                target: parse_address("target", &target)?,
                data,
                reward: parse_amount("reward", &reward)?,
                nonce,
                deadline,
                energy: U256::from(energy),
            };
            let signed = SignedBounty::sign(bounty, &domain, &signer)?;
            signed.verify(&domain)?;
            serde_json::to_string_pretty(&signed)?
        }
    };

    println!("{json}");
    Ok(())
}
