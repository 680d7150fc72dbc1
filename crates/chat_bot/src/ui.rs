//! Reply texts.

use std::fmt::Write;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use engine::{
    Author, BudgetLevel, BudgetStatus, CategoryTotals, Entry, Insight, KeywordAdded, Ledger,
    MoneyCents, Period, Trend,
};

pub(crate) const APOLOGY: &str =
    "❌ Ocorreu um erro ao processar sua mensagem. Por favor, tente novamente.";
pub(crate) const UNSAVED_WARNING: &str =
    "⚠️ Não foi possível salvar os dados. A alteração vale até o bot reiniciar; nova tentativa no próximo registro.";
pub(crate) const CONVERSATION_BOUND: &str = "✅ Este chat foi configurado como seu chat principal com o bot. Agora o bot só responderá às suas mensagens neste chat.";
pub(crate) const NOTHING_RECORDED: &str = "📭 Nenhum gasto registrado ainda.";
pub(crate) const NOTHING_TO_UNDO: &str = "📭 Nenhum gasto registrado para excluir.";
pub(crate) const NOTHING_THIS_MONTH: &str = "📭 Nenhum gasto registrado este mês.";
pub(crate) const NO_BUDGETS: &str = "📭 Nenhum orçamento definido ainda. Use \"definir orçamento para CATEGORIA R$XX\" para criar.";
pub(crate) const INVALID_BUDGET: &str = "⚠️ O valor do orçamento deve ser maior que zero.";
pub(crate) const RECEIPT_SAVED: &str = "📸 Comprovante salvo! Por favor, informe o valor e a categoria usando o comando:\n*valor comprovante R$XX.XX categoria*";
pub(crate) const RECEIPT_FAILED: &str = "❌ Erro ao processar o comprovante. Tente novamente.";
pub(crate) const NO_PENDING_RECEIPT: &str = "❌ Nenhum comprovante recente encontrado para atualizar.";
pub(crate) const CONTACT_REJECTED: &str = "⚠️ Contato já está na lista ou número inválido.";
pub(crate) const CONTACT_NOT_FOUND: &str = "⚠️ Contato não encontrado na lista.";
pub(crate) const NO_CONTACTS: &str = "📭 Nenhum contato na lista de permitidos.";
const NOT_ENOUGH_DATA: &str = "Registre mais gastos para receber insights personalizados.";

const LATEST_ENTRIES: usize = 5;
const MEDALS: [&str; 3] = ["🥇", "🥈", "🥉"];

fn percent(value: f64) -> String {
    format!("{:.0}%", value.round())
}

fn period_name(period: Period) -> &'static str {
    match period {
        Period::Day => "hoje",
        Period::Week => "semana",
        Period::Month => "mês",
        Period::Year => "ano",
    }
}

fn with_alerts(mut reply: String, alerts: &[BudgetStatus]) -> String {
    if !alerts.is_empty() {
        let lines: Vec<String> = alerts.iter().map(alert).collect();
        reply.push_str("\n\n");
        reply.push_str(&lines.join("\n"));
    }
    reply
}

pub(crate) fn invalid_amount(raw: &str) -> String {
    format!(
        "⚠️ Valor inválido: {raw}. Use até duas casas decimais e no máximo {}, por exemplo 12,50.",
        MoneyCents::MAX_AMOUNT
    )
}

pub(crate) fn alert(status: &BudgetStatus) -> String {
    match status.level {
        BudgetLevel::Exceeded => format!(
            "🚨 ALERTA: Orçamento de {} EXCEDIDO! ({} de {})",
            status.category, status.spent, status.limit
        ),
        _ => format!(
            "⚠️ Você já usou {} do orçamento de {} ({} de {})",
            percent(status.percent()),
            status.category,
            status.spent,
            status.limit
        ),
    }
}

pub(crate) fn expense_recorded(entry: &Entry, alerts: &[BudgetStatus]) -> String {
    with_alerts(
        format!("💸 Gasto registrado: {} com {}", entry.value, entry.category),
        alerts,
    )
}

pub(crate) fn income_recorded(entry: &Entry) -> String {
    format!(
        "💰 Receita registrada: {} de {}",
        entry.value,
        entry.source.as_deref().unwrap_or_default()
    )
}

pub(crate) fn receipt_amended(entry: &Entry, alerts: &[BudgetStatus]) -> String {
    with_alerts(
        format!("✅ Comprovante atualizado: {} com {}", entry.value, entry.category),
        alerts,
    )
}

pub(crate) fn budget_defined(category: &str, limit: MoneyCents) -> String {
    format!("✅ Orçamento definido: {limit} para {category}")
}

pub(crate) fn keyword_added(outcome: KeywordAdded, keyword: &str, category: &str) -> String {
    match outcome {
        KeywordAdded::AlreadyPresent => {
            format!("⚠️ Palavra-chave \"{keyword}\" já existe na categoria \"{category}\"")
        }
        KeywordAdded::Added | KeywordAdded::CategoryCreated => {
            format!("✅ Palavra-chave \"{keyword}\" adicionada à categoria \"{category}\"")
        }
    }
}

pub(crate) fn undone(entry: &Entry) -> String {
    format!(
        "✅ Último registro excluído: {} com {}",
        entry.value, entry.category
    )
}

pub(crate) fn summary(ledger: &Ledger, tz: Tz) -> String {
    if ledger.is_empty() {
        return NOTHING_RECORDED.to_string();
    }

    let balance = ledger.balance();
    let mut text = String::from("📊 *RESUMO FINANCEIRO*\n\n");
    let _ = writeln!(text, "💰 Total de receitas: {}", ledger.total_income());
    let _ = writeln!(text, "💸 Total de gastos: {}", ledger.total_expenses());
    let marker = if balance.is_negative() { "❌" } else { "✅" };
    let _ = writeln!(text, "{marker} Saldo: {balance}\n");

    text.push_str("*Últimos 5 gastos:*\n");
    for (i, entry) in ledger.latest_expenses(LATEST_ENTRIES).iter().enumerate() {
        let _ = writeln!(
            text,
            "{}. {} - {}: {} ({})",
            i + 1,
            date(entry.timestamp, tz),
            entry.category,
            entry.value,
            author(&entry.author)
        );
    }
    text
}

pub(crate) fn category_summary(ledger: &Ledger, totals: &CategoryTotals) -> String {
    if ledger.is_empty() {
        return NOTHING_RECORDED.to_string();
    }

    let lines: Vec<String> = totals
        .iter()
        .map(|(category, total)| format!("{category}: {total}"))
        .collect();
    format!("📊 *GASTOS POR CATEGORIA*\n\n{}", lines.join("\n"))
}

/// `totals` holds the non-income spend of `period`, already ranked.
pub(crate) fn period_summary(period: Period, totals: &CategoryTotals) -> String {
    let name = period_name(period);
    if totals.is_empty() {
        return format!("📭 Nenhum gasto registrado para {name}.");
    }

    let total = totals.total();
    let lines: Vec<String> = totals
        .iter()
        .map(|(category, value)| {
            format!(
                "{category}: {value} ({})",
                percent(value.percent_of(total))
            )
        })
        .collect();
    format!(
        "📊 *RESUMO DE {}*\n\nTotal: {total}\n\n{}",
        name.to_uppercase(),
        lines.join("\n")
    )
}

pub(crate) fn insights(insights: &[Insight]) -> String {
    if insights.is_empty() {
        return format!("📊 {NOT_ENOUGH_DATA}");
    }

    let lines: Vec<String> = insights
        .iter()
        .map(|insight| match insight {
            Insight::NotEnoughData => NOT_ENOUGH_DATA.to_string(),
            Insight::TopCategory { category, total } => {
                format!("📊 Seu maior gasto este mês foi com {category}: {total}")
            }
            Insight::MonthOverMonth(Trend::Up(change)) => format!(
                "📈 Seus gastos aumentaram {} em relação ao mês anterior.",
                percent(*change)
            ),
            Insight::MonthOverMonth(Trend::Down(change)) => format!(
                "📉 Seus gastos diminuíram {} em relação ao mês anterior. Parabéns!",
                percent(*change)
            ),
            Insight::MonthOverMonth(Trend::Stable) => {
                "🔄 Seus gastos estão estáveis em relação ao mês anterior.".to_string()
            }
        })
        .collect();
    format!("📊 *INSIGHTS FINANCEIROS*\n\n{}", lines.join("\n\n"))
}

pub(crate) fn budgets(statuses: &[BudgetStatus]) -> String {
    if statuses.is_empty() {
        return NO_BUDGETS.to_string();
    }

    let mut text = String::from("📊 *ORÇAMENTOS DO MÊS*\n\n");
    for status in statuses {
        let marker = match status.level {
            BudgetLevel::Exceeded => "🚨",
            BudgetLevel::Warning => "⚠️",
            BudgetLevel::Within => "✅",
        };
        let _ = writeln!(
            text,
            "{marker} {}: {} de {} ({})",
            status.category,
            status.spent,
            status.limit,
            percent(status.percent())
        );
    }
    text
}

/// `month` holds the current-month non-income spend, already ranked.
pub(crate) fn ranking(ledger: &Ledger, month: &CategoryTotals) -> String {
    if ledger.is_empty() {
        return NOTHING_RECORDED.to_string();
    }
    if month.is_empty() {
        return NOTHING_THIS_MONTH.to_string();
    }

    let mut text = String::from("🏆 *RANKING DE GASTOS DO MÊS*\n\n");
    for (i, (category, total)) in month.iter().enumerate() {
        let position = MEDALS
            .get(i)
            .map_or_else(|| format!("{}.", i + 1), |medal| medal.to_string());
        let _ = writeln!(text, "{position} {category}: {total}");
    }
    text
}

pub(crate) fn status(
    started_at: DateTime<Utc>,
    now: DateTime<Utc>,
    entries: usize,
    contacts: usize,
) -> String {
    let uptime = (now - started_at).num_seconds().max(0);
    let days = uptime / 86_400;
    let hours = (uptime % 86_400) / 3_600;
    let minutes = (uptime % 3_600) / 60;

    let mut text = String::from("🖥️ *STATUS DO SERVIDOR*\n\n✅ Bot está online\n");
    let _ = writeln!(text, "⏱️ Tempo de atividade: {days}d {hours}h {minutes}m");
    let _ = writeln!(text, "📊 Registros: {entries}");
    let _ = writeln!(text, "👥 Contatos permitidos: {contacts}");
    let _ = writeln!(text, "💾 Versão: {}", env!("CARGO_PKG_VERSION"));
    text
}

pub(crate) fn help(owner: bool) -> String {
    let mut text = String::from(
        "🤖 *COMANDOS DISPONÍVEIS*\n\n\
         *Registrar Transações:*\n\
         - *Gastei R$XX com YYY* → Registra um gasto\n\
         - *Recebi R$XX de YYY* → Registra uma receita\n\
         - Envie uma foto com a palavra *comprovante* → Registra gasto com comprovante\n\
         - *Valor comprovante R$XX categoria* → Define valor e categoria do último comprovante\n\n\
         *Consultas:*\n\
         - *Resumo* → Mostra resumo geral\n\
         - *Resumo por categoria* → Mostra gastos agrupados por categoria\n\
         - *Resumo hoje/semana/mês/ano* → Mostra gastos do período\n\
         - *Ranking* → Mostra ranking de gastos por categoria\n\
         - *Insights* → Receba dicas personalizadas\n\
         - *Orçamentos* → Veja seus orçamentos e limites\n\n\
         *Configurações:*\n\
         - *Definir orçamento para CATEGORIA R$XX* → Cria limite de gastos\n\
         - *Adicionar PALAVRA à categoria CATEGORIA* → Personaliza categorização\n\
         - *Excluir último* → Remove o último registro\n\
         - *Configurar chat* → Define este chat como principal\n\
         - *Status* → Verifica status do servidor\n",
    );

    if owner {
        text.push_str(
            "\n👑 *Comandos de Administração:*\n\
             - *Permitir NÚMERO* → Adiciona contato à lista de permitidos\n\
             - *Remover NÚMERO* → Remove contato da lista de permitidos\n\
             - *Listar permitidos* → Mostra todos os contatos permitidos\n",
        );
    }
    text
}

pub(crate) fn contact_allowed(contact: &str) -> String {
    format!("✅ Contato {contact} adicionado à lista de permitidos.")
}

pub(crate) fn contact_removed(contact: &str) -> String {
    format!("✅ Contato {contact} removido da lista de permitidos.")
}

pub(crate) fn contacts<'a>(contacts: impl Iterator<Item = &'a str>) -> String {
    let mut text = String::from("📋 Contatos permitidos:\n\n");
    let mut empty = true;
    for (i, contact) in contacts.enumerate() {
        empty = false;
        let _ = writeln!(text, "{}. {contact}", i + 1);
    }
    if empty {
        return NO_CONTACTS.to_string();
    }
    text
}

fn date(timestamp: DateTime<Utc>, tz: Tz) -> String {
    timestamp.with_timezone(&tz).format("%d/%m/%Y").to_string()
}

fn author(author: &Author) -> String {
    match author {
        Author::Owner => "por você".to_string(),
        Author::Contact(id) => format!("por {id}"),
    }
}
