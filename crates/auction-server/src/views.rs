//! HTML rendering

use std::fmt::Write;

/// What the home page shows under the forms
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Invalid(String),
    ContractError { message: String, outcome_unknown: bool },
}

pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n<body>\n{}</body>\n</html>\n",
        escape(title),
        body
    )
}

fn notice_html(notice: &Notice) -> String {
    match notice {
        Notice::Success(message) => {
            format!("<p class=\"result\">{}</p>\n", escape(message))
        }
        Notice::Invalid(message) => {
            format!("<p class=\"invalid\">Invalid input: {}</p>\n", escape(message))
        }
        Notice::ContractError {
            message,
            outcome_unknown,
        } => {
            let mut html = format!(
                "<p class=\"contract-error\">Contract error: {}</p>\n",
                escape(message)
            );
            if *outcome_unknown {
                html.push_str(
                    "<p class=\"outcome-unknown\">The transaction was sent but no receipt arrived in time. \
                     Its outcome is unknown and it may still be mined.</p>\n",
                );
            }
            html
        }
    }
}

/// Home page: the bid form, the two query forms and an optional notice
pub fn home(contract: &str, notice: Option<&Notice>) -> String {
    let mut body = String::new();
    body.push_str("<h1>Simple Auction</h1>\n");
    let _ = writeln!(body, "<p>Contract: <code>{}</code></p>", escape(contract));

    if let Some(notice) = notice {
        body.push_str(&notice_html(notice));
    }

    body.push_str(
        "<form action=\"/bid\" method=\"post\">\n\
         <label>Bidder address <input name=\"bidder_address\"></label>\n\
         <label>Bid amount (ether) <input name=\"bid_amount\"></label>\n\
         <button type=\"submit\">Bid</button>\n\
         </form>\n\
         <form action=\"/highestbidder\" method=\"post\"><button type=\"submit\">Highest bidder</button></form>\n\
         <form action=\"/highestbid\" method=\"post\"><button type=\"submit\">Highest bid</button></form>\n",
    );

    page("Simple Auction", &body)
}

pub fn error_page() -> String {
    page(
        "Error",
        "<h1>Something went wrong</h1>\n<p><a href=\"/\">Back to the auction</a></p>\n",
    )
}
